//! Batch conversion.
//!
//! [`Converter::process_directory`] is the whole pipeline for one run:
//!
//! 1. **Scan** the source tree ([`crate::scan`]), skipping the destination
//!    directory and hidden entries.
//! 2. **Cache lookup** ([`crate::cache`]): a source whose
//!    `<stem>_processed.jpg` already exists is skipped without being opened.
//! 3. **Validate** ([`crate::validate`]) everything else.
//! 4. **Convert** valid files through the [`ImageBackend`].
//!
//! Per-file problems become [`FileOutcome::Failed`] entries and the batch
//! moves on. Only environment failures (root missing, destination not
//! creatable) abort the run with a [`ProcessError`].
//!
//! [`Converter::check_directory`] runs steps 1-3 and writes nothing.
//!
//! ## Output Structure
//!
//! ```text
//! images/
//! ├── beach.jpg
//! ├── scans/
//! │   └── page-01.png
//! └── ready-images/
//!     ├── beach_processed.jpg
//!     └── page-01_processed.jpg
//! ```
//!
//! Processing is sequential: each file is opened, converted and closed
//! before the next one.

use crate::cache::{CacheLookup, CacheStats, SentinelCache};
use crate::config::ConverterConfig;
use crate::imaging::{ConvertParams, ImageBackend, Quality, RustBackend};
use crate::scan::{ScanEntry, scan};
use crate::validate::{Rule, ValidationResult, ValidationRules, Violation, validate};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Why a single file produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FileFailure {
    /// One or more validation rules failed.
    Invalid { violations: Vec<Violation> },
    /// An earlier source in the walk already owns the output name.
    OutputConflict { output: PathBuf, claimed_by: PathBuf },
    /// The file validated but could not be encoded or written.
    ConversionFailed { reason: String },
    /// The walker could not read the entry.
    Unreadable { reason: String },
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { violations } => {
                let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                f.write_str(&messages.join("; "))
            }
            Self::OutputConflict { output, claimed_by } => write!(
                f,
                "output conflict: {} is already produced from {}",
                output.display(),
                claimed_by.display()
            ),
            Self::ConversionFailed { reason } => write!(f, "conversion failed: {reason}"),
            Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
        }
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// A new output was written.
    Processed {
        output: PathBuf,
        width: u32,
        height: u32,
    },
    /// Valid and uncached; `check` mode stopped before converting.
    WouldProcess {
        output: PathBuf,
        width: u32,
        height: u32,
    },
    /// The output already existed.
    Skipped { output: PathBuf },
    Failed { failure: FileFailure },
}

impl FileOutcome {
    fn failed(failure: FileFailure) -> Self {
        Self::Failed { failure }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Result of one run, in walk order.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    /// `true` for [`Converter::check_directory`] runs.
    pub dry_run: bool,
    pub elapsed_secs: f64,
    pub entries: Vec<FileReport>,
}

impl ProcessReport {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Processed { .. }))
    }

    pub fn would_process(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::WouldProcess { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Failed entries with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &FileFailure)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            FileOutcome::Failed { failure } => Some((e.source.as_path(), failure)),
            _ => None,
        })
    }

    /// Number of files that violated `rule`.
    pub fn count_rule(&self, rule: Rule) -> usize {
        self.failures()
            .filter(|(_, failure)| match failure {
                FileFailure::Invalid { violations } => violations.iter().any(|v| v.rule() == rule),
                _ => false,
            })
            .count()
    }

    pub fn cache_stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in &self.entries {
            match entry.outcome {
                FileOutcome::Skipped { .. } => stats.hit(),
                _ => stats.miss(),
            }
        }
        stats
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ProcessError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Convert,
    Check,
}

/// Validates and converts a source tree into `ready-images/`.
pub struct Converter<B: ImageBackend = RustBackend> {
    config: ConverterConfig,
    rules: ValidationRules,
    backend: B,
}

impl Converter<RustBackend> {
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_backend(config, RustBackend::new())
    }
}

impl<B: ImageBackend> Converter<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(config: ConverterConfig, backend: B) -> Self {
        Self {
            rules: ValidationRules::from_config(&config),
            config,
            backend,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Convert every valid, uncached image under `root`.
    pub fn process_directory(&self, root: &Path) -> Result<ProcessReport, ProcessError> {
        self.run(root, Mode::Convert)
    }

    /// Report what [`process_directory`](Self::process_directory) would do
    /// without writing anything.
    pub fn check_directory(&self, root: &Path) -> Result<ProcessReport, ProcessError> {
        self.run(root, Mode::Check)
    }

    fn run(&self, root: &Path, mode: Mode) -> Result<ProcessReport, ProcessError> {
        let start = Instant::now();

        if !root.exists() {
            return Err(ProcessError::SourceNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ProcessError::NotADirectory(root.to_path_buf()));
        }

        let dry_run = mode == Mode::Check;
        let output_dir = self.config.output_dir(root);
        if !dry_run {
            std::fs::create_dir_all(&output_dir)?;
        }
        tracing::info!(
            root = %root.display(),
            output_dir = %output_dir.display(),
            dry_run,
            "scanning"
        );

        let scanned = scan(root, &output_dir);
        let mut cache = SentinelCache::new(&output_dir);
        let mut entries = Vec::with_capacity(scanned.len());

        for entry in scanned {
            let (source, outcome) = match entry {
                ScanEntry::Candidate(source) => {
                    let outcome = self.process_file(&mut cache, &source, mode);
                    (source, outcome)
                }
                ScanEntry::Unreadable { path, reason } => {
                    (path, FileOutcome::failed(FileFailure::Unreadable { reason }))
                }
            };
            entries.push(FileReport { source, outcome });
        }

        let report = ProcessReport {
            root: root.to_path_buf(),
            output_dir,
            dry_run,
            elapsed_secs: start.elapsed().as_secs_f64(),
            entries,
        };
        tracing::info!(
            processed = report.processed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "finished in {:.2}s",
            report.elapsed_secs
        );
        Ok(report)
    }

    fn process_file(&self, cache: &mut SentinelCache, source: &Path, mode: Mode) -> FileOutcome {
        let Some(output) = cache.output_for(source) else {
            return FileOutcome::failed(FileFailure::Unreadable {
                reason: "file name has no stem".into(),
            });
        };

        match cache.lookup(&output) {
            CacheLookup::Conflict { claimed_by } => {
                tracing::warn!(
                    source = %source.display(),
                    "output {} already claimed by {}",
                    output.display(),
                    claimed_by.display()
                );
                return FileOutcome::failed(FileFailure::OutputConflict { output, claimed_by });
            }
            CacheLookup::Hit => {
                tracing::debug!(source = %source.display(), "cached");
                cache.claim(output.clone(), source.to_path_buf());
                return FileOutcome::Skipped { output };
            }
            CacheLookup::Miss => {}
        }

        // Claim before validating: an invalid first source still owns the name.
        cache.claim(output.clone(), source.to_path_buf());

        let file = match validate(&self.backend, source, &self.rules) {
            ValidationResult::Valid(file) => file,
            ValidationResult::Invalid(violations) => {
                let failure = FileFailure::Invalid { violations };
                tracing::warn!(source = %source.display(), "{failure}");
                return FileOutcome::failed(failure);
            }
        };

        if mode == Mode::Check {
            return FileOutcome::WouldProcess {
                output,
                width: file.width,
                height: file.height,
            };
        }

        let params = ConvertParams {
            source: file.path,
            output: output.clone(),
            quality: Quality::new(self.config.quality),
            max_dimension: self.config.max_dimension,
        };
        match self.backend.convert(&params) {
            Ok(dims) => {
                tracing::info!(
                    source = %source.display(),
                    "wrote {} ({}x{})",
                    output.display(),
                    dims.width,
                    dims.height
                );
                FileOutcome::Processed {
                    output,
                    width: dims.width,
                    height: dims.height,
                }
            }
            Err(e) => {
                let failure = FileFailure::ConversionFailed {
                    reason: e.to_string(),
                };
                tracing::warn!(source = %source.display(), "{failure}");
                FileOutcome::failed(failure)
            }
        }
    }
}
