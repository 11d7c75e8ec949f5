//! Deterministic output naming.
//!
//! Every source maps to exactly one output name: the source stem followed by
//! `_processed.jpg`. The original extension is dropped, so `dawn.png` and
//! `dawn.JPG` both map to `dawn_processed.jpg`:
//!
//! - `beach.jpg` → `beach_processed.jpg`
//! - `scans/page-01.png` → `page-01_processed.jpg`
//! - `archive.tar.jpeg` → `archive.tar_processed.jpg`
//!
//! Directory structure is not mirrored; all outputs land flat in the
//! destination directory. [`crate::cache`] detects two sources competing for
//! the same name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to the source stem.
pub const OUTPUT_SUFFIX: &str = "_processed";

/// Extension of every output file.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Output file name for a source path, or `None` if the path has no stem.
///
/// Works on `OsStr` so non-UTF-8 stems are carried through unchanged.
pub fn output_file_name(source: &Path) -> Option<OsString> {
    let stem = source.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(OUTPUT_SUFFIX);
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    Some(name)
}

/// Full output path for a source inside `output_dir`.
pub fn output_path(output_dir: &Path, source: &Path) -> Option<PathBuf> {
    output_file_name(source).map(|name| output_dir.join(name))
}
