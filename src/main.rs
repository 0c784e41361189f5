//! pileup - import newly added albums into a music library.
//!
//! Albums appear in shared (usually synced) folders. pileup finds the ones
//! that have not been imported yet, checks their tags, optionally repairs
//! metadata, and hands them to the configured library. Run it by hand, or
//! from a scheduler with `--is-scheduled-run`, in which case problems are
//! reported as notifications and the log is also written to a file.

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod import;
pub mod library;
pub mod metadata;
pub mod model;
pub mod notify;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log targets outside the `pileup::` module path are listed explicitly.
const DEFAULT_FILTER: &str = "pileup=info,import=info,library=info,history=info,config=info";

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let scheduled = args.is_scheduled_run();

    // Scheduled runs have no terminal, so they also log to a file
    let file_layer = scheduled.then(open_log_file).flatten().map(|file| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    if scheduled {
        tracing::info!(started = %chrono::Local::now().to_rfc3339(), "Scheduled import");
    }

    cli::run_command(&args)
}

/// Open the scheduled-run log for appending, creating it if needed.
fn open_log_file() -> Option<std::fs::File> {
    let path = config::log_path()?;
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create log directory {}: {e}", parent.display());
        return None;
    }

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", path.display());
            None
        }
    }
}
