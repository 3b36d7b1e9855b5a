//! Orientation lookup through the EXIF block the image codecs expose.
//!
//! Only container headers are read; pixel data is never decoded here.

use std::io::{BufRead, Seek};

use imageproc::image::metadata::Orientation;
use imageproc::image::{ImageDecoder, ImageReader};

use crate::error::MetadataError;
use crate::orientation::ExifOrientation;

/// Scan any seekable stream for its orientation tag.
///
/// Streams in a format no codec recognises report [`MetadataError::Absent`].
/// A missing or out of range tag inside a recognised container is
/// [`ExifOrientation::Normal`].
pub fn scan<R: BufRead + Seek>(reader: R) -> Result<ExifOrientation, MetadataError> {
    let mut reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| MetadataError::from_read(e, "truncated header"))?;

    let Some(format) = reader.format() else {
        return Err(MetadataError::Absent);
    };
    // Nothing gets allocated for pixels on this pass
    reader.no_limits();

    let mut decoder = reader
        .into_decoder()
        .map_err(MetadataError::from_image_error)?;
    let orientation = decoder
        .orientation()
        .map_err(MetadataError::from_image_error)?;

    let orientation = ExifOrientation::from(orientation);
    log::trace!("{format:?} orientation tag {}", orientation.tag());
    Ok(orientation)
}

impl From<Orientation> for ExifOrientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::NoTransforms => ExifOrientation::Normal,
            Orientation::FlipHorizontal => ExifOrientation::FlipHorizontal,
            Orientation::Rotate180 => ExifOrientation::Rotate180,
            Orientation::FlipVertical => ExifOrientation::FlipVertical,
            Orientation::Rotate90FlipH => ExifOrientation::Transpose,
            Orientation::Rotate90 => ExifOrientation::Rotate90,
            Orientation::Rotate270FlipH => ExifOrientation::Transverse,
            Orientation::Rotate270 => ExifOrientation::Rotate270,
        }
    }
}
