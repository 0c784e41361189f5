//! Logs command - show the log written by scheduled imports.

use std::path::Path;

use crate::config;
use crate::error::{Error, Result, ResultExt};

/// Marks the log lines written when an album is committed.
const IMPORT_MARKERS: [&str; 2] = ["Imported album", "Imported WAV album"];

/// Print the scheduled-run log, or only its import lines.
pub fn cmd_logs(imported: bool) -> anyhow::Result<()> {
    let path = config::log_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine the data directory"))?;

    let contents = match read_log(&path) {
        Ok(contents) => contents,
        Err(Error::NotFound(path)) => {
            println!("No log found at {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for line in filter_lines(&contents, imported) {
        println!("{line}");
    }
    Ok(())
}

fn read_log(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    std::fs::read_to_string(path).with_context(format!("while reading {}", path.display()))
}

fn filter_lines(contents: &str, imported: bool) -> impl Iterator<Item = &str> {
    contents.lines().filter(move |line| {
        !imported || IMPORT_MARKERS.iter().any(|marker| line.contains(marker))
    })
}
