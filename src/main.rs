//! blocklist-filter: removes excluded phone numbers from a large blocklist.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use blocklist_filter::{FilterConfig, FilterError};

/// Streams a blocklist CSV and drops every number found in an exclusion list.
#[derive(Parser, Debug)]
#[command(name = "blocklist-filter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exclusion list (first `;`-separated field of each line).
    #[arg(long)]
    exclusion: Option<PathBuf>,

    /// Blocklist CSV to filter.
    #[arg(long)]
    blocklist: Option<PathBuf>,

    /// Output CSV, overwritten on every run.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rows read per batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Blocklist column holding the phone number.
    #[arg(long)]
    key_column: Option<String>,

    /// Only replace the output once the whole blocklist has been processed.
    #[arg(long)]
    atomic: bool,

    /// Print the run summary to stdout as JSON.
    #[arg(long)]
    json: bool,

    /// Validate configuration and inputs without writing output.
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(hint = e.hint(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<(), FilterError> {
    let config = build_config(args)?;

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        info!("Exclusion list: {}", config.exclusion_path.display());
        info!("Blocklist: {}", config.blocklist_path.display());
        info!("Output: {}", config.output_path.display());
        blocklist_filter::dry_run(&config)?;
        info!("Configuration is valid");
        return Ok(());
    }

    let summary = blocklist_filter::run(&config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| FilterError::Io(format!("Failed to serialize summary: {}", e)))?;
        println!("{}", json);
    }

    Ok(())
}

/// Loads the config file, if any, and applies flag overrides.
fn build_config(args: &Args) -> Result<FilterConfig, FilterError> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::from_yaml_file(path)?,
        None => FilterConfig::default(),
    };

    if let Some(path) = &args.exclusion {
        config.exclusion_path = path.clone();
    }
    if let Some(path) = &args.blocklist {
        config.blocklist_path = path.clone();
    }
    if let Some(path) = &args.output {
        config.output_path = path.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(column) = &args.key_column {
        config.key_column = column.clone();
    }
    if args.atomic {
        config.atomic_output = true;
    }

    config.validate()?;
    Ok(config)
}
