//! Accepted source formats and content sniffing.
//!
//! Only JPEG and PNG decoders are compiled in. A file is classified twice:
//! once by extension (cheap, no I/O) and once by its magic bytes, so a GIF
//! renamed to `.png` is still rejected as the wrong format.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of leading bytes inspected when sniffing content.
const SNIFF_LEN: u64 = 32;

/// Extensions accepted for each source format (lowercase, no dot).
const EXTENSIONS: &[(&str, SourceFormat)] = &[
    ("jpg", SourceFormat::Jpeg),
    ("jpeg", SourceFormat::Jpeg),
    ("png", SourceFormat::Png),
];

/// A source image format the converter can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    /// Classify a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| ext.eq_ignore_ascii_case(candidate))
            .map(|(_, format)| *format)
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }

    /// Every extension recognized as some source format.
    pub fn known_extensions() -> impl Iterator<Item = &'static str> {
        EXTENSIONS.iter().map(|(ext, _)| *ext)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
        }
    }
}

/// Identify a file's format from its leading bytes.
///
/// Returns `Ok(None)` when the bytes match no known image signature, which
/// the validator treats as corruption rather than a format mismatch.
pub fn sniff_format(path: &Path) -> io::Result<Option<ImageFormat>> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(image::guess_format(&head).ok())
}

/// Display name for any format `image` can recognize.
pub fn format_name(format: ImageFormat) -> String {
    match SourceFormat::from_image_format(format) {
        Some(source) => source.to_string(),
        None => format!("{format:?}").to_uppercase(),
    }
}
