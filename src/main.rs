use clap::{Parser, Subcommand};
use ready_images::config::{self, ConfigOverrides};
use ready_images::output;
use ready_images::process::Converter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ready-images")]
#[command(version)]
#[command(about = "Validate photos and normalize them into ready-to-use JPEGs")]
#[command(long_about = "\
Validate photos and normalize them into ready-to-use JPEGs

Every JPG/PNG under the source directory is checked (format, size, full
decode, minimum width) and converted to an upright RGB JPEG:

  images/
  ├── beach.jpg
  ├── scans/
  │   └── page-01.png
  └── ready-images/                # created on first run, never scanned
      ├── beach_processed.jpg
      └── page-01_processed.jpg

A source whose output already exists is skipped. Delete an output to have
it regenerated on the next run.

Settings come from ready-images.toml in the working directory (or --config),
overridden by environment variables and flags. Run 'ready-images gen-config'
to print a documented config file.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=ready_images=debug) for
more detail.")]
struct Cli {
    /// Config file (default: ./ready-images.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to scan
    #[arg(long, env = "SOURCE_PATH", global = true)]
    source: Option<PathBuf>,

    /// Minimum display width in pixels
    #[arg(long, env = "MIN_WIDTH", global = true)]
    min_width: Option<u32>,

    /// JPEG quality, 1-100
    #[arg(long, env = "QUALITY", global = true)]
    quality: Option<u32>,

    /// Reject sources larger than this many bytes
    #[arg(long, env = "MAX_FILE_SIZE", global = true)]
    max_file_size: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_path: self.source.clone(),
            min_width: self.min_width,
            quality: self.quality,
            max_file_size: self.max_file_size,
        }
    }
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Also write the report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and convert (the default)
    Run(RunArgs),
    /// Show what a run would do without writing anything
    Check,
    /// Print a stock ready-images.toml with all options documented
    GenConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ready_images=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve layered config and build the converter for its source root.
fn build_converter(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<(Converter, PathBuf), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = config::load_config(explicit, &cwd, overrides)?;
    let root = config.source_path.clone();
    Ok((Converter::new(config), root))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let overrides = cli.overrides();
    let explicit = cli.config.as_deref();

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            let (converter, root) = build_converter(explicit, &overrides)?;
            let report = converter.process_directory(&root)?;
            output::print_report(&report);
            if let Some(path) = args.report {
                report.save_json(&path)?;
                tracing::info!("report written to {}", path.display());
            }
        }
        Command::Check => {
            let (converter, root) = build_converter(explicit, &overrides)?;
            output::print_config_summary(converter.config());
            println!();
            let report = converter.check_directory(&root)?;
            output::print_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
