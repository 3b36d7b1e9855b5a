//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use imageproc::image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

const ORIENTATION_TAG: u16 = 0x0112;
const TIFF_SHORT: u16 = 3;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Every pixel is distinct so transforms can be checked exactly.
pub fn pattern(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, (x * 7 + y) as u8, 255]))
}

pub fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png(img: &RgbaImage) -> Vec<u8> {
    encode(DynamicImage::ImageRgba8(img.clone()), ImageFormat::Png)
}

/// Minimal little-endian TIFF structure holding only an orientation entry.
pub fn tiff_block(tag_value: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(26);

    // header, IFD0 right after it
    buf.extend_from_slice(b"II");
    buf.extend_from_slice(&42u16.to_le_bytes());
    buf.extend_from_slice(&8u32.to_le_bytes());

    // one SHORT entry, value left-justified in the 4 byte slot
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&ORIENTATION_TAG.to_le_bytes());
    buf.extend_from_slice(&TIFF_SHORT.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&tag_value.to_le_bytes());
    buf.extend_from_slice(&[0, 0]);

    // no next IFD
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf
}

/// PNG with an eXIf chunk placed right after IHDR.
pub fn tagged_png(img: &RgbaImage, tag_value: u16) -> Vec<u8> {
    let plain = png(img);
    // signature (8) + IHDR chunk (4 + 4 + 13 + 4)
    let (head, tail) = plain.split_at(33);

    let tiff = tiff_block(tag_value);
    let mut chunk = (tiff.len() as u32).to_be_bytes().to_vec();
    let mut body = b"eXIf".to_vec();
    body.extend_from_slice(&tiff);
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());

    [head, chunk.as_slice(), tail].concat()
}

/// JPEG with an APP1 Exif segment inserted right after SOI.
pub fn tagged_jpeg(width: u32, height: u32, tag_value: u16) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let jpeg = encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let tiff = tiff_block(tag_value);
    let length = (2 + EXIF_HEADER.len() + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + 2 + length as usize);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}
