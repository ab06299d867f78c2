//! tocmend - repair the table-of-contents section of a document

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tocmend_core::{Config, Engine};

/// Repair and regenerate document tables of contents
#[derive(Parser, Debug)]
#[command(name = "tocmend")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a config file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair a single document and write the result
    Run {
        /// Input document
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output location
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// Serve the HTTP repair endpoint
    Serve {
        /// Bind address, overriding the configured one
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };

    match args.command {
        Command::Run { input, output } => run_once(&config, &input, &output),
        Command::Serve { addr } => {
            let mut config = config;
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            tocmend_server::run_blocking(config)
        }
    }
}

fn run_once(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let engine =
        Engine::startup(&config.server.scratch_dir).context("Failed to start document engine")?;
    let session = engine.acquire_session()?;

    let report = session
        .repair(input, output, config)
        .with_context(|| format!("Failed to repair document: {}", input.display()))?;

    println!("{}", report.summary());
    if !report.is_clean() {
        log::warn!("repair completed with degraded steps");
    }
    Ok(())
}
