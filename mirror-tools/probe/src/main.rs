//! Mirror Probe Binary
//!
//! Run with: `mirror-probe [OPTIONS] <COMMAND>`

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mirror::Config;
use mirror_probe::{execute, sample, Command};

#[derive(Parser)]
#[command(name = "mirror-probe")]
#[command(about = "Resolve and invoke members of a sample type registry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file path (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => Config::default(),
    };
    debug!(?config, "configuration");

    let registry = sample::registry();
    let report = execute(&registry, &config, &cli.command)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
