use imageproc::image::{ColorType, DynamicImage};

use crate::orientation::Transform;

/// Compressed image bytes as handed over by the upstream producer.
///
/// The format is sniffed from content, never declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImageBuffer {
    data: Vec<u8>,
    timestamp_us: i64,
}

impl CompressedImageBuffer {
    pub fn new(data: Vec<u8>, timestamp_us: i64) -> Self {
        Self { data, timestamp_us }
    }

    /// Build from a backing vector and the number of valid bytes in it.
    ///
    /// Panics if `length` does not match the vector, since a short or padded
    /// view means the producer handed over a broken buffer.
    pub fn from_parts(data: Vec<u8>, length: usize, timestamp_us: i64) -> Self {
        assert_eq!(
            data.len(),
            length,
            "compressed buffer must cover exactly {length} bytes"
        );
        Self::new(data, timestamp_us)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp in microseconds.
    pub fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }
}

/// A decoded, oriented pixel buffer plus the timestamp of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    image: DynamicImage,
    timestamp_us: i64,
    applied: Transform,
}

impl DecodedImage {
    pub(crate) fn new(image: DynamicImage, timestamp_us: i64, applied: Transform) -> Self {
        debug_assert!(image.width() > 0 && image.height() > 0);
        Self {
            image,
            timestamp_us,
            applied,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Pixel layout of [`Self::as_bytes`].
    pub fn color_type(&self) -> ColorType {
        self.image.color()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.color_type().bytes_per_pixel() as usize
    }

    /// Row-major pixel bytes, `width * height * bytes_per_pixel` long.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    pub fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    /// The orientation correction that produced this buffer.
    pub fn applied_transform(&self) -> Transform {
        self.applied
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}
