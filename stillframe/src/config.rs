use imageproc::image::Limits;
use serde::{Deserialize, Serialize};

use crate::orientation::MirroredPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Read the EXIF orientation and correct the pixels for it.
    pub apply_orientation: bool,
    pub mirrored: MirroredPolicy,
    pub limits: DecodeLimits,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            apply_orientation: true,
            mirrored: MirroredPolicy::Ignore,
            limits: DecodeLimits::default(),
        }
    }
}

/// Resource caps forwarded to the pixel decoder. `None` keeps the decoder's
/// own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    // Bytes
    pub max_alloc: Option<u64>,
}

impl DecodeLimits {
    pub(crate) fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = self.max_width;
        limits.max_image_height = self.max_height;
        if let Some(max_alloc) = self.max_alloc {
            limits.max_alloc = Some(max_alloc);
        }
        limits
    }
}
