//! The decode stage: compressed bytes in, oriented pixels out.

use std::any::Any;
use std::fmt::Debug;
use std::io::{BufRead, Cursor, Seek};
use std::panic::{self, AssertUnwindSafe};

use imageproc::image::{DynamicImage, ImageError, ImageReader};

use crate::buffer::{CompressedImageBuffer, DecodedImage};
use crate::config::DecoderConfig;
use crate::error::{resolve_orientation, DecodeError};
use crate::exif;
use crate::orientation::{ExifOrientation, Transform};

/// A decoder that turns one input buffer into one output image per call.
///
/// Implementations hold at most one buffer pair in flight; callers that want
/// parallelism create one instance per worker.
pub trait FrameDecoder: Debug {
    fn name(&self) -> &str;
    fn decode(&mut self, buffer: CompressedImageBuffer) -> Result<DecodedImage, DecodeError>;
}

/// Decodes any format the `image` crate can sniff and corrects the result for
/// its EXIF orientation.
#[derive(Debug, Clone, Default)]
pub struct ImageOrientationDecoder {
    config: DecoderConfig,
}

impl ImageOrientationDecoder {
    pub const NAME: &'static str = "ImageOrientationDecoder";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode `buffer` and apply its orientation.
    ///
    /// Never panics on bad input: corrupt data, metadata failures and panics
    /// raised inside codecs all come back as a [`DecodeError`].
    pub fn decode(&self, buffer: CompressedImageBuffer) -> Result<DecodedImage, DecodeError> {
        let timestamp_us = buffer.timestamp_us();
        let data = buffer.data();

        let (image, applied) =
            catch_codec_panic(|| self.decode_oriented(data, Cursor::new(data)))?;

        log::debug!(
            "Decoded {} bytes into {}x{} {:?} (rotation {}°, flipped {}) at {timestamp_us}us",
            data.len(),
            image.width(),
            image.height(),
            image.color(),
            applied.rotation.degrees(),
            applied.flip_horizontal,
        );

        Ok(DecodedImage::new(image, timestamp_us, applied))
    }

    /// Pixels come from `data`; the orientation from `metadata`, a second
    /// stream over the same bytes.
    fn decode_oriented<R: BufRead + Seek>(
        &self,
        data: &[u8],
        metadata: R,
    ) -> Result<(DynamicImage, Transform), DecodeError> {
        // Pixel failures win over anything the metadata scan has to say
        let image = self.decode_pixels(data)?;

        let orientation = if self.config.apply_orientation {
            resolve_orientation(exif::scan(metadata))?
        } else {
            ExifOrientation::Normal
        };

        let transform = orientation.transform(self.config.mirrored);
        Ok((transform.apply(image), transform))
    }

    fn decode_pixels(&self, data: &[u8]) -> Result<DynamicImage, DecodeError> {
        let byte_length = data.len();

        let mut reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DecodeError::from_image_error(byte_length, ImageError::IoError(e)))?;

        if reader.format().is_none() {
            log::debug!("Unrecognized image format ({byte_length} bytes)");
            return Err(DecodeError::corrupt(byte_length, None));
        }

        reader.limits(self.config.limits.to_image_limits());
        let image = reader
            .decode()
            .map_err(|e| DecodeError::from_image_error(byte_length, e))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::corrupt(byte_length, None));
        }

        Ok(image)
    }
}

impl FrameDecoder for ImageOrientationDecoder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decode(&mut self, buffer: CompressedImageBuffer) -> Result<DecodedImage, DecodeError> {
        ImageOrientationDecoder::decode(self, buffer)
    }
}

/// Run a codec call, turning a panic raised inside it into an error.
fn catch_codec_panic<T>(
    f: impl FnOnce() -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload);
            log::error!("Image codec panicked: {message}");
            Err(DecodeError::unexpected(message))
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "decoder panicked".to_string()
    }
}
