//! Display settings for a texture overlay composited on top of decoded frames.

use serde::{Deserialize, Serialize};

/// Row-major 4x4 identity.
#[rustfmt::skip]
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("alpha needs to be in the interval [0, 1], got {0}")]
    InvalidArgument(f32),
}

/// How an overlay is displayed. Build with [`OverlaySettingsBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOverlaySettings")]
pub struct OverlaySettings {
    use_hdr: bool,
    alpha: f32,
    matrix: [f32; 16],
}

impl OverlaySettings {
    pub fn builder() -> OverlaySettingsBuilder {
        OverlaySettingsBuilder::new()
    }

    /// Whether the overlay colors are linear BT.2020 rather than linear BT.709.
    pub fn use_hdr(&self) -> bool {
        self.use_hdr
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Transform applied to the overlay before compositing.
    pub fn matrix(&self) -> &[f32; 16] {
        &self.matrix
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        OverlaySettingsBuilder::new().build()
    }
}

#[derive(Deserialize)]
struct RawOverlaySettings {
    #[serde(default)]
    use_hdr: bool,
    #[serde(default = "default_alpha")]
    alpha: f32,
    #[serde(default = "identity")]
    matrix: [f32; 16],
}

fn default_alpha() -> f32 {
    1.0
}

fn identity() -> [f32; 16] {
    IDENTITY_MATRIX
}

impl TryFrom<RawOverlaySettings> for OverlaySettings {
    type Error = SettingsError;

    fn try_from(raw: RawOverlaySettings) -> Result<Self, Self::Error> {
        let mut builder = OverlaySettingsBuilder::new();
        builder
            .set_uses_hdr(raw.use_hdr)
            .set_matrix(raw.matrix)
            .set_alpha(raw.alpha)?;
        Ok(builder.build())
    }
}

#[derive(Debug, Clone)]
pub struct OverlaySettingsBuilder {
    use_hdr: bool,
    alpha: f32,
    matrix: [f32; 16],
}

impl OverlaySettingsBuilder {
    pub fn new() -> Self {
        Self {
            use_hdr: false,
            alpha: 1.0,
            matrix: IDENTITY_MATRIX,
        }
    }

    pub fn set_uses_hdr(&mut self, use_hdr: bool) -> &mut Self {
        self.use_hdr = use_hdr;
        self
    }

    /// Not validated; any 16 values are accepted.
    pub fn set_matrix(&mut self, matrix: [f32; 16]) -> &mut Self {
        self.matrix = matrix;
        self
    }

    /// 0 is fully transparent, 1 fully opaque. Bounds are inclusive.
    pub fn set_alpha(&mut self, alpha: f32) -> Result<&mut Self, SettingsError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(SettingsError::InvalidArgument(alpha));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Snapshot the current values. The builder can keep being used.
    pub fn build(&self) -> OverlaySettings {
        OverlaySettings {
            use_hdr: self.use_hdr,
            alpha: self.alpha,
            matrix: self.matrix,
        }
    }
}

impl Default for OverlaySettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
