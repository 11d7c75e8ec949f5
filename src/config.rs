//! Converter configuration.
//!
//! Configuration is layered, lowest priority first:
//!
//! 1. stock defaults ([`ConverterConfig::default`]),
//! 2. a TOML file: `ready-images.toml` in the working directory, or the
//!    file passed with `--config`,
//! 3. environment variables and CLI flags ([`ConfigOverrides`]).
//!
//! The result is validated once at startup and passed into the converter;
//! nothing reads configuration after that.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_path = "images"            # Directory to scan (env: SOURCE_PATH)
//! output_dir_name = "ready-images"  # Created inside source_path
//! min_width = 600                   # Minimum display width in px (env: MIN_WIDTH)
//! allowed_formats = ["jpeg", "png"] # Subset of jpeg, png
//! quality = 90                      # JPEG quality 1-100 (env: QUALITY)
//! # max_file_size = 10485760        # Reject sources larger than this many bytes (env: MAX_FILE_SIZE)
//! # max_dimension = 2400            # Downscale so the longer edge fits
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::SourceFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = "ready-images.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter settings.
///
/// All fields have defaults; config files only need the keys they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Root directory to scan.
    pub source_path: PathBuf,
    /// Destination directory name, created directly inside `source_path`.
    pub output_dir_name: String,
    /// Minimum display width in pixels.
    pub min_width: u32,
    /// Source formats accepted by validation.
    pub allowed_formats: Vec<SourceFormat>,
    /// Byte ceiling for source files. `None` disables the check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Downscale outputs so the longer edge fits. `None` keeps full size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dimension: Option<u32>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("images"),
            output_dir_name: "ready-images".to_string(),
            min_width: 600,
            allowed_formats: vec![SourceFormat::Jpeg, SourceFormat::Png],
            max_file_size: None,
            quality: 90,
            max_dimension: None,
        }
    }
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_width == 0 {
            return Err(ConfigError::Validation("min_width must be at least 1".into()));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.allowed_formats.is_empty() {
            return Err(ConfigError::Validation(
                "allowed_formats must not be empty".into(),
            ));
        }
        if self.max_file_size == Some(0) {
            return Err(ConfigError::Validation(
                "max_file_size must be positive (omit it to disable the limit)".into(),
            ));
        }
        if let Some(max) = self.max_dimension
            && max < self.min_width
        {
            return Err(ConfigError::Validation(format!(
                "max_dimension ({max}) must not be smaller than min_width ({})",
                self.min_width
            )));
        }
        validate_dir_name(&self.output_dir_name)
    }

    /// Absolute-or-relative path of the destination directory.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir_name)
    }
}

/// The destination must be a single plain directory name inside the root,
/// otherwise it could not be excluded from the walk.
fn validate_dir_name(name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "output_dir_name must be a single directory name, got {name:?}"
        ))),
    }
}

/// Values supplied through the environment or command line.
///
/// Applied after the config file, so they always win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub source_path: Option<PathBuf>,
    pub min_width: Option<u32>,
    pub quality: Option<u32>,
    pub max_file_size: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ConverterConfig) {
        if let Some(path) = &self.source_path {
            config.source_path = path.clone();
        }
        if let Some(min_width) = self.min_width {
            config.min_width = min_width;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(max) = self.max_file_size {
            config.max_file_size = Some(max);
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer that file overlays are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConverterConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file that must exist.
pub fn read_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load `ready-images.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_config_file(&config_path).map(Some)
}

/// Merge an optional file overlay onto the defaults, apply overrides, then
/// deserialize and validate.
pub fn resolve_config(
    overlay: Option<toml::Value>,
    overrides: &ConfigOverrides,
) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: ConverterConfig = merged.try_into()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load the full configuration.
///
/// With `explicit` set, that file must exist. Otherwise `search_dir` is
/// checked for an optional `ready-images.toml`.
pub fn load_config(
    explicit: Option<&Path>,
    search_dir: &Path,
    overrides: &ConfigOverrides,
) -> Result<ConverterConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(read_config_file(path)?),
        None => load_raw_config(search_dir)?,
    };
    resolve_config(overlay, overrides)
}

/// Returns a fully-commented stock `ready-images.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ready-images configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Environment variables and command-line flags override this file.
# Unknown keys will cause an error.

# Directory to scan for images (env: SOURCE_PATH, flag: --source).
source_path = "images"

# Name of the output directory, created inside source_path.
# It is skipped while scanning, so outputs are never re-processed.
output_dir_name = "ready-images"

# Minimum width in pixels, measured after EXIF rotation
# (env: MIN_WIDTH, flag: --min-width).
min_width = 600

# Accepted source formats. Any subset of "jpeg" and "png".
allowed_formats = ["jpeg", "png"]

# JPEG encoding quality, 1 (worst) to 100 (best)
# (env: QUALITY, flag: --quality).
quality = 90

# Reject sources larger than this many bytes
# (env: MAX_FILE_SIZE, flag: --max-file-size). Unlimited when omitted.
# max_file_size = 10485760

# Downscale outputs so the longer edge fits within this many pixels.
# Must be at least min_width. Full resolution when omitted.
# max_dimension = 2400
"##
}
