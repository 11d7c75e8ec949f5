//! Candidate discovery.
//!
//! Walks the source tree and lists every regular file, in sorted order, as a
//! conversion candidate. Nothing is filtered by extension here: a `.gif`
//! must reach validation so it can be reported as unsupported.
//!
//! ## Skipped entries
//!
//! - the destination directory (`<root>/ready-images`) and everything in it,
//!   so outputs are never fed back in as sources; a nested directory that
//!   merely shares the name is still scanned,
//! - hidden files and directories (name starts with `.`),
//! - anything that is not a file (symlinks are followed only to check that
//!   they point at a file).
//!
//! Entries the walker cannot read (permission errors, vanished files) are
//! yielded in their walk position instead of aborting, so they get their own
//! per-file outcome alongside their neighbours.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One entry of the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// A regular file to validate.
    Candidate(PathBuf),
    /// Something the walker could not read.
    Unreadable { path: PathBuf, reason: String },
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Enumerate entries under `root` in walk order, excluding `output_dir`.
pub fn scan(root: &Path, output_dir: &Path) -> Vec<ScanEntry> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(is_hidden(e) || e.path() == output_dir));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.depth() > 0 && entry.path().is_file() {
                    entries.push(ScanEntry::Candidate(entry.into_path()));
                } else {
                    tracing::trace!(path = %entry.path().display(), "not a candidate");
                }
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                tracing::warn!(path = %path.display(), "cannot read entry: {err}");
                entries.push(ScanEntry::Unreadable {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    entries
}
