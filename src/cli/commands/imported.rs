//! Imported command - list albums in the import history.

use std::path::Path;

use crate::config;
use crate::error::{Result, ResultExt};
use crate::history::HistoryStore;

/// Print every album recorded in the import history.
pub fn cmd_imported(config_file: Option<&Path>) -> anyhow::Result<()> {
    let albums = imported_albums(config_file)?;

    if albums.is_empty() {
        println!("No albums have been imported yet.");
        return Ok(());
    }

    for album in &albums {
        println!("{album}");
    }
    println!("\n{} album(s) imported", albums.len());
    Ok(())
}

fn imported_albums(config_file: Option<&Path>) -> Result<Vec<String>> {
    let config = config::load(config_file).with_context("while loading configuration")?;
    Ok(HistoryStore::open(&config.history_file).albums())
}
