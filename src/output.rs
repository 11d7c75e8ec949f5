//! CLI output formatting.
//!
//! # Output Format
//!
//! The report groups files by outcome. Every file keeps its 1-based position
//! in the walk so entries can be matched against the log. The source path is
//! shown relative to the scanned root as indented context:
//!
//! ```text
//! Processed
//! 003 beach.jpg → beach_processed.jpg (800x600)
//!     Source: trips/beach.jpg
//!
//! Skipped (cached)
//! 002 dawn.jpg → dawn_processed.jpg
//!
//! Failed
//! 001 anim.gif
//!     Source: anim.gif
//!     unsupported format: .gif is not one of .jpg, .jpeg, .png
//!
//! 1 processed, 1 skipped, 1 failed (3 total) in 0.04s
//! ```
//!
//! A `check` run prints `Would process` instead of `Processed`.
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ConverterConfig;
use crate::process::{FileFailure, FileOutcome, FileReport, ProcessReport};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// One line per reason: each violated rule gets its own line.
fn failure_lines(failure: &FileFailure) -> Vec<String> {
    match failure {
        FileFailure::Invalid { violations } => violations.iter().map(|v| v.to_string()).collect(),
        other => vec![other.to_string()],
    }
}

fn entry_lines(index: usize, entry: &FileReport, root: &Path) -> Vec<String> {
    let name = file_name(&entry.source);
    let source = format!("    Source: {}", relative(&entry.source, root));
    match &entry.outcome {
        FileOutcome::Processed {
            output,
            width,
            height,
        }
        | FileOutcome::WouldProcess {
            output,
            width,
            height,
        } => vec![
            format!(
                "{} {} → {} ({}x{})",
                format_index(index),
                name,
                file_name(output),
                width,
                height
            ),
            source,
        ],
        FileOutcome::Skipped { output } => vec![format!(
            "{} {} → {}",
            format_index(index),
            name,
            file_name(output)
        )],
        FileOutcome::Failed { failure } => {
            let mut lines = vec![format!("{} {}", format_index(index), name), source];
            lines.extend(failure_lines(failure).into_iter().map(|l| format!("    {l}")));
            lines
        }
    }
}

/// Aggregate counts line, e.g. `3 processed, 1 skipped, 2 failed (6 total) in 0.12s`.
pub fn format_summary(report: &ProcessReport) -> String {
    let done = if report.dry_run {
        format!("{} to process", report.would_process())
    } else {
        format!("{} processed", report.processed())
    };
    format!(
        "{}, {} skipped, {} failed ({} total) in {:.2}s",
        done,
        report.skipped(),
        report.failed(),
        report.total(),
        report.elapsed_secs
    )
}

/// Format a full run report, grouped by outcome.
pub fn format_report(report: &ProcessReport) -> Vec<String> {
    let sections: [(&str, fn(&FileOutcome) -> bool); 4] = [
        ("Processed", |o| matches!(o, FileOutcome::Processed { .. })),
        ("Would process", |o| {
            matches!(o, FileOutcome::WouldProcess { .. })
        }),
        ("Skipped (cached)", |o| matches!(o, FileOutcome::Skipped { .. })),
        ("Failed", |o| matches!(o, FileOutcome::Failed { .. })),
    ];

    let mut lines = Vec::new();
    for (title, belongs) in sections {
        let members: Vec<(usize, &FileReport)> = report
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| belongs(&e.outcome))
            .map(|(i, e)| (i + 1, e))
            .collect();
        if members.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        for (index, entry) in members {
            lines.extend(entry_lines(index, entry, &report.root));
        }
        lines.push(String::new());
    }

    if report.entries.is_empty() {
        lines.push(format!("No files found in {}", report.root.display()));
    }
    lines.push(format_summary(report));
    lines
}

/// Print a run report to stdout.
pub fn print_report(report: &ProcessReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

/// Format the effective configuration.
pub fn format_config_summary(config: &ConverterConfig) -> Vec<String> {
    let formats: Vec<String> = config
        .allowed_formats
        .iter()
        .map(|f| f.to_string())
        .collect();
    vec![
        "Config".to_string(),
        format!("    Source: {}", config.source_path.display()),
        format!(
            "    Output: {}",
            config.output_dir(&config.source_path).display()
        ),
        format!("    Min width: {}px", config.min_width),
        format!("    Formats: {}", formats.join(", ")),
        format!("    Quality: {}", config.quality),
        format!(
            "    Max file size: {}",
            config
                .max_file_size
                .map_or("none".to_string(), |b| format!("{b} bytes"))
        ),
        format!(
            "    Max dimension: {}",
            config
                .max_dimension
                .map_or("none".to_string(), |px| format!("{px}px"))
        ),
    ]
}

/// Print the effective configuration to stdout.
pub fn print_config_summary(config: &ConverterConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}
