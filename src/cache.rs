//! Sentinel cache for idempotent runs.
//!
//! There is no cache database. The output file itself is the cache entry:
//! if `<output_dir>/<stem>_processed.jpg` exists, its source counts as
//! processed and is skipped without being opened.
//!
//! # Invalidation
//!
//! Deleting an output file forces reprocessing of exactly that one source on
//! the next run. Nothing else is tracked, so editing a source in place does
//! *not* trigger reprocessing; delete its output to pick up the change.
//!
//! # One source per output
//!
//! Output names drop directories and extensions (see [`crate::naming`]), so
//! `a/dawn.jpg` and `b/dawn.png` compete for `dawn_processed.jpg`. The cache
//! remembers which source claimed each output during a run; later sources
//! mapping to a claimed output get [`CacheLookup::Conflict`]. Sources are
//! walked in sorted order and the first one claims the name before it is
//! validated, so the same source wins on every run even when it turns out
//! to be invalid and no output is ever written.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Result of looking up a source's expected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The output exists on disk: skip the source.
    Hit,
    /// No output yet: validate and convert.
    Miss,
    /// Another source already owns this output in the current run.
    Conflict { claimed_by: PathBuf },
}

/// Output-existence cache with per-run ownership tracking.
#[derive(Debug)]
pub struct SentinelCache {
    output_dir: PathBuf,
    /// Output path → source that produced (or was cached as) it this run.
    claims: HashMap<PathBuf, PathBuf>,
}

impl SentinelCache {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            claims: HashMap::new(),
        }
    }

    /// Expected output path for a source, or `None` if it has no file stem.
    pub fn output_for(&self, source: &Path) -> Option<PathBuf> {
        crate::naming::output_path(&self.output_dir, source)
    }

    /// Check whether `output` is already produced or claimed.
    ///
    /// Claims take priority over disk state: an output written earlier in
    /// this run by another source is a conflict, not a hit.
    pub fn lookup(&self, output: &Path) -> CacheLookup {
        if let Some(owner) = self.claims.get(output) {
            return CacheLookup::Conflict {
                claimed_by: owner.clone(),
            };
        }
        if output.exists() {
            CacheLookup::Hit
        } else {
            CacheLookup::Miss
        }
    }

    /// Record that `source` owns `output` for the rest of this run.
    pub fn claim(&mut self, output: PathBuf, source: PathBuf) {
        self.claims.entry(output).or_insert(source);
    }
}

/// Summary of cache behavior for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} checked ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} checked", self.misses)
        }
    }
}
