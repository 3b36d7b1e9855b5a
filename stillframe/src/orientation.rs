//! EXIF orientation values and the lossless transforms that undo them.

use imageproc::image::DynamicImage;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

/// Value of EXIF tag 0x0112.
///
/// ```text
///     1: Normal      2: FlipH       3: Rotate180   4: FlipV
///     ┌───┐          ┌───┐          ┌───┐          ┌───┐
///     │ F │          │ Ꟊ │          │   │          │   │
///     │   │          │   │          │ Ꟊ │          │ F │
///     └───┘          └───┘          └───┘          └───┘
///
///     5: Transpose   6: Rotate90    7: Transverse  8: Rotate270
///     ┌────┐         ┌────┐         ┌────┐         ┌────┐
///     │ F  │         │  F │         │  Ꟊ │         │ Ꟊ  │
///     └────┘         └────┘         └────┘         └────┘
/// ```
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, TryFromPrimitive, EnumIter, IntoStaticStr,
)]
#[repr(u16)]
pub enum ExifOrientation {
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    Transpose = 5,
    Rotate90 = 6,
    Transverse = 7,
    Rotate270 = 8,
}

impl ExifOrientation {
    /// Parse a raw tag value; anything outside 1..=8 is `None`.
    pub fn from_tag(value: u16) -> Option<Self> {
        Self::try_from(value).ok()
    }

    pub fn tag(self) -> u16 {
        self as u16
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Self::FlipHorizontal | Self::FlipVertical | Self::Transpose | Self::Transverse
        )
    }

    /// The correction needed to display stored pixels upright.
    pub fn transform(self, policy: MirroredPolicy) -> Transform {
        let exact = match self {
            Self::Normal => Transform::IDENTITY,
            Self::FlipHorizontal => Transform::new(Rotation::None, true),
            Self::Rotate180 => Transform::new(Rotation::Clockwise180, false),
            Self::FlipVertical => Transform::new(Rotation::Clockwise180, true),
            Self::Transpose => Transform::new(Rotation::Clockwise90, true),
            Self::Rotate90 => Transform::new(Rotation::Clockwise90, false),
            Self::Transverse => Transform::new(Rotation::Clockwise270, true),
            Self::Rotate270 => Transform::new(Rotation::Clockwise270, false),
        };

        if !self.is_mirrored() {
            return exact;
        }

        match policy {
            MirroredPolicy::Ignore => Transform::IDENTITY,
            MirroredPolicy::Apply => exact,
            // Same degrees a rotation-only reader reports for mirrored tags
            MirroredPolicy::RotationOnly => {
                let rotation = match self {
                    Self::FlipVertical => Rotation::Clockwise180,
                    Self::Transpose => Rotation::Clockwise270,
                    Self::Transverse => Rotation::Clockwise90,
                    _ => Rotation::None,
                };
                Transform::new(rotation, false)
            }
        }
    }
}

/// Clockwise rotation in quarter turns.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
    IntoStaticStr,
)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

/// What to do with mirrored EXIF orientations (2, 4, 5, 7).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum MirroredPolicy {
    /// Leave the pixels untouched.
    #[default]
    Ignore,
    /// Apply only the rotation part, dropping the mirror.
    RotationOnly,
    /// Apply the full correction including the flip.
    Apply,
}

/// A rotation followed by an optional horizontal flip.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Transform {
    pub rotation: Rotation,
    pub flip_horizontal: bool,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::None,
        flip_horizontal: false,
    };

    pub const fn new(rotation: Rotation, flip_horizontal: bool) -> Self {
        Self {
            rotation,
            flip_horizontal,
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Apply to a pixel buffer. Identity hands the buffer back without copying.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        if self.is_identity() {
            return img;
        }

        let rotated = match self.rotation {
            Rotation::None => img,
            Rotation::Clockwise90 => img.rotate90(),
            Rotation::Clockwise180 => img.rotate180(),
            Rotation::Clockwise270 => img.rotate270(),
        };

        if self.flip_horizontal {
            rotated.fliph()
        } else {
            rotated
        }
    }
}

impl From<Rotation> for Transform {
    fn from(rotation: Rotation) -> Self {
        Transform::new(rotation, false)
    }
}
