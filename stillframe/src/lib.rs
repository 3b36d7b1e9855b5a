//! Single-slot still image decode stage.
//!
//! Turns one compressed image buffer into one decoded, orientation-corrected
//! image carrying the source timestamp.

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod exif;
pub mod orientation;
pub mod overlay;
pub mod slots;

// Re-export commonly used types
pub use buffer::{CompressedImageBuffer, DecodedImage};
pub use config::{DecodeLimits, DecoderConfig};
pub use decoder::{FrameDecoder, ImageOrientationDecoder};
pub use error::{DecodeError, MetadataError};
pub use orientation::{ExifOrientation, MirroredPolicy, Rotation, Transform};
pub use overlay::{OverlaySettings, OverlaySettingsBuilder, SettingsError};
pub use slots::{InputSlot, OutputSlot, SingleSlotDecoder, SlotError, SlotPool};
