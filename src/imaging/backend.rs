//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the converter needs:
//! `identify` (full decode, report display dimensions) and `convert`
//! (normalize and write a JPEG).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` defined below.

use super::params::ConvertParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions, as displayed (after EXIF orientation is applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Decode the whole image and return its display dimensions.
    ///
    /// A full decode (not just a header read) so truncated files are caught
    /// here rather than halfway through a conversion.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Normalize `params.source` into a JPEG at `params.output`.
    ///
    /// Must never overwrite an existing file at `params.output`. Returns the
    /// dimensions of the written image.
    fn convert(&self, params: &ConvertParams) -> Result<Dimensions, BackendError>;
}
