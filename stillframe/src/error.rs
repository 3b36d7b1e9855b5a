//! Decode error taxonomy and the rule table merging pixel decode with the
//! best-effort metadata scan.

use std::io;

use imageproc::image::ImageError;

use crate::orientation::ExifOrientation;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not an image format we can decode, or they are corrupt.
    #[error("could not decode image data (data length = {byte_length})")]
    UnsupportedOrCorruptData {
        byte_length: usize,
        #[source]
        source: Option<ImageError>,
    },

    /// Reading the orientation metadata failed for a reason other than the
    /// tag being absent or malformed.
    #[error("failed to read image metadata")]
    MetadataReadFailure {
        #[source]
        cause: io::Error,
    },

    #[error("unexpected decode error: {cause}")]
    UnexpectedInternalError {
        #[source]
        cause: BoxError,
    },
}

impl DecodeError {
    pub(crate) fn corrupt(byte_length: usize, source: Option<ImageError>) -> Self {
        DecodeError::UnsupportedOrCorruptData {
            byte_length,
            source,
        }
    }

    pub(crate) fn unexpected(cause: impl Into<BoxError>) -> Self {
        DecodeError::UnexpectedInternalError {
            cause: cause.into(),
        }
    }

    /// Classify an error from the pixel decoder.
    pub(crate) fn from_image_error(byte_length: usize, err: ImageError) -> Self {
        let corrupt = match &err {
            ImageError::Decoding(_) | ImageError::Unsupported(_) | ImageError::Limits(_) => true,
            ImageError::IoError(io_err) => matches!(
                io_err.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData
            ),
            _ => false,
        };

        if corrupt {
            Self::corrupt(byte_length, Some(err))
        } else {
            Self::unexpected(err)
        }
    }

    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, DecodeError::UnsupportedOrCorruptData { .. })
    }
}

/// Why no orientation could be read from a buffer.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("no orientation tag present")]
    Absent,

    #[error("malformed metadata: {0}")]
    Malformed(&'static str),

    #[error("metadata read failed")]
    Io(#[from] io::Error),
}

impl MetadataError {
    /// Running out of bytes or reading garbage means the metadata itself is
    /// broken; every other reader failure is systemic.
    pub(crate) fn from_read(err: io::Error, what: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
                MetadataError::Malformed(what)
            }
            _ => MetadataError::Io(err),
        }
    }

    /// Classify an error raised by a codec while reading headers.
    pub(crate) fn from_image_error(err: ImageError) -> Self {
        match err {
            ImageError::IoError(e) => Self::from_read(e, "truncated metadata"),
            _ => MetadataError::Malformed("unreadable container header"),
        }
    }
}

/// Merge the metadata scan result into the decode outcome.
///
/// | scan result          | outcome                |
/// |----------------------|------------------------|
/// | `Ok(tag)`            | `tag`                  |
/// | `Err(Absent)`        | `Normal`               |
/// | `Err(Malformed(_))`  | `Normal`               |
/// | `Err(Io(_))`         | `MetadataReadFailure`  |
pub fn resolve_orientation(
    scan: Result<ExifOrientation, MetadataError>,
) -> Result<ExifOrientation, DecodeError> {
    match scan {
        Ok(orientation) => Ok(orientation),
        Err(MetadataError::Absent) => Ok(ExifOrientation::Normal),
        Err(MetadataError::Malformed(what)) => {
            log::warn!("Ignoring orientation, {what}");
            Ok(ExifOrientation::Normal)
        }
        Err(MetadataError::Io(cause)) => Err(DecodeError::MetadataReadFailure { cause }),
    }
}
