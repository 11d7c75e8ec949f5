//! Validation rules applied to every candidate before conversion.
//!
//! | Rule | Check | Needs decode |
//! |---|---|---|
//! | `unsupported-format` | extension is `.jpg`/`.jpeg`/`.png` and allowed; content is not another image format | no |
//! | `file-too-large` | byte size ≤ `max_file_size` | no |
//! | `corrupt-image` | the whole file decodes | yes |
//! | `below-minimum-width` | display width ≥ `min_width` | yes |
//!
//! The two cheap rules are always both evaluated, so a file can report
//! several violations at once. If either fails the file is never decoded.
//! Unrecognizable bytes behind an accepted extension count as corruption,
//! not as a format mismatch.

use crate::config::ConverterConfig;
use crate::imaging::{ImageBackend, SourceFormat, format_name, sniff_format};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rule identifiers, for grouping and counting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    UnsupportedFormat,
    FileTooLarge,
    CorruptImage,
    BelowMinimumWidth,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnsupportedFormat => "unsupported-format",
            Self::FileTooLarge => "file-too-large",
            Self::CorruptImage => "corrupt-image",
            Self::BelowMinimumWidth => "below-minimum-width",
        };
        f.write_str(name)
    }
}

/// A single violated rule with the details needed to explain it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum Violation {
    #[error("unsupported format: {reason}")]
    UnsupportedFormat { reason: String },
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("corrupt image: {reason}")]
    CorruptImage { reason: String },
    #[error("below minimum width: {width}px < {min_width}px")]
    BelowMinimumWidth { width: u32, min_width: u32 },
}

impl Violation {
    pub fn rule(&self) -> Rule {
        match self {
            Self::UnsupportedFormat { .. } => Rule::UnsupportedFormat,
            Self::FileTooLarge { .. } => Rule::FileTooLarge,
            Self::CorruptImage { .. } => Rule::CorruptImage,
            Self::BelowMinimumWidth { .. } => Rule::BelowMinimumWidth,
        }
    }
}

/// A source file that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub format: SourceFormat,
    /// Display width (after EXIF orientation).
    pub width: u32,
    /// Display height (after EXIF orientation).
    pub height: u32,
    pub byte_size: u64,
}

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(ImageFile),
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(violations) => violations,
        }
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.violations().iter().map(Violation::rule).collect()
    }
}

/// The subset of configuration the rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub allowed_formats: Vec<SourceFormat>,
    pub min_width: u32,
    pub max_file_size: Option<u64>,
}

impl ValidationRules {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            allowed_formats: config.allowed_formats.clone(),
            min_width: config.min_width,
            max_file_size: config.max_file_size,
        }
    }

    fn allowed_names(&self) -> String {
        self.allowed_formats
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

/// Check the extension, then confirm the content agrees.
fn check_format(path: &Path, rules: &ValidationRules) -> Result<SourceFormat, Violation> {
    let Some(by_extension) = SourceFormat::from_path(path) else {
        let known: Vec<String> = SourceFormat::known_extensions()
            .map(|e| format!(".{e}"))
            .collect();
        let reason = match path.extension() {
            Some(ext) => format!(".{} is not one of {}", ext.to_string_lossy(), known.join(", ")),
            None => format!("no file extension (expected one of {})", known.join(", ")),
        };
        return Err(Violation::UnsupportedFormat { reason });
    };
    if !rules.allowed_formats.contains(&by_extension) {
        return Err(Violation::UnsupportedFormat {
            reason: format!("{by_extension} is not allowed (allowed: {})", rules.allowed_names()),
        });
    }

    // An unreadable head or unknown signature is left for the decoder to
    // report as corruption.
    let Ok(Some(sniffed)) = sniff_format(path) else {
        return Ok(by_extension);
    };
    match SourceFormat::from_image_format(sniffed) {
        Some(by_content) if rules.allowed_formats.contains(&by_content) => Ok(by_content),
        Some(by_content) => Err(Violation::UnsupportedFormat {
            reason: format!(
                "content is {by_content}, which is not allowed (allowed: {})",
                rules.allowed_names()
            ),
        }),
        None => Err(Violation::UnsupportedFormat {
            reason: format!(
                "content is {} despite the {by_extension} extension",
                format_name(sniffed)
            ),
        }),
    }
}

/// Run every rule against `path`.
///
/// Never fails: problems reading the file are reported as violations.
pub fn validate(
    backend: &impl ImageBackend,
    path: &Path,
    rules: &ValidationRules,
) -> ValidationResult {
    let mut violations = Vec::new();

    let format = match check_format(path, rules) {
        Ok(format) => Some(format),
        Err(violation) => {
            violations.push(violation);
            None
        }
    };

    let byte_size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            violations.push(Violation::CorruptImage {
                reason: format!("cannot read file: {e}"),
            });
            return ValidationResult::Invalid(violations);
        }
    };
    if let Some(limit) = rules.max_file_size
        && byte_size > limit
    {
        violations.push(Violation::FileTooLarge {
            size: byte_size,
            limit,
        });
    }

    let Some(format) = format else {
        return ValidationResult::Invalid(violations);
    };
    if !violations.is_empty() {
        return ValidationResult::Invalid(violations);
    }

    let dims = match backend.identify(path) {
        Ok(dims) => dims,
        Err(e) => {
            return ValidationResult::Invalid(vec![Violation::CorruptImage {
                reason: e.to_string(),
            }]);
        }
    };
    if dims.width < rules.min_width {
        return ValidationResult::Invalid(vec![Violation::BelowMinimumWidth {
            width: dims.width,
            min_width: rules.min_width,
        }]);
    }

    ValidationResult::Valid(ImageFile {
        path: path.to_path_buf(),
        format,
        width: dims.width,
        height: dims.height,
        byte_size,
    })
}
