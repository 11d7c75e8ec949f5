//! # Ready Images
//!
//! Validates a directory tree of JPG/PNG photos and normalizes every
//! acceptable one into a plain JPEG under `ready-images/`.
//!
//! # Pipeline
//!
//! ```text
//! images/            walk (sorted, hidden entries skipped)
//!   → cache lookup   ready-images/<stem>_processed.jpg exists? skip
//!   → validate       format, size, full decode, display width
//!   → convert        orient, flatten to RGB, optional downscale, JPEG encode
//!   → report         processed / skipped / failed, per file
//! ```
//!
//! A bad file never stops the batch; it becomes a failed entry in the
//! [`process::ProcessReport`]. Only a missing source root or an uncreatable
//! destination abort a run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered `ready-images.toml` loading, env/CLI overrides, validation, stock template |
//! | [`scan`] | Recursive candidate enumeration, excluding the destination and hidden entries |
//! | [`naming`] | `<stem>_processed.jpg` output naming |
//! | [`cache`] | Output-existence cache and per-run ownership of output names |
//! | [`validate`] | Format, size, corruption and minimum-width rules |
//! | [`imaging`] | `ImageBackend` trait and the pure-Rust `RustBackend` |
//! | [`process`] | `Converter`: the batch loop and `ProcessReport` |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## The Output File Is the Cache
//!
//! There is no manifest or hash database. If the expected output exists the
//! source is done. Deleting one output reprocesses exactly that source; edits
//! to a source in place are not noticed.
//!
//! ## Never Overwrite
//!
//! Outputs are encoded into a hidden temporary file in the destination and
//! moved into place with a no-clobber rename, so an interrupted run never
//! leaves a truncated JPEG that later runs would mistake for a finished one.
//!
//! ## Display Orientation Everywhere
//!
//! EXIF orientation is applied at decode time. Width checks see the image as
//! a viewer would, and outputs carry upright pixels with no orientation tag.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
