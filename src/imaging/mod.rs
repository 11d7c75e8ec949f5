//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` on the leading bytes |
//! | **Identify** | full decode + EXIF orientation |
//! | **Convert → JPEG** | orient, optional Lanczos3 downscale, flatten to RGB, encode |
//!
//! The module is split into:
//! - **Format**: [`SourceFormat`] and content sniffing
//! - **Parameters**: data describing a conversion
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod format;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use format::{SourceFormat, format_name, sniff_format};
pub use params::{ConvertParams, Quality};
pub use rust_backend::RustBackend;
