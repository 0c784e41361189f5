//! Import command.

use anyhow::Context;
use std::path::Path;
use tracing::info;

use super::{ImportArgs, OutputFormat, flag_pair};
use crate::config::{self, Config, ImportConfig, NotificationConfig};
use crate::history::HistoryStore;
use crate::import::{
    ImportReport, Importer, Prompter, StdinPrompter, display_album, error_album_message, selection,
};
use crate::library::AnyLibrary;
use crate::metadata::LoftyTagReader;
use crate::model::{AlbumCandidate, ImportMode};
use crate::notify::{self, Notifier};
use crate::scanner;

/// Import new albums.
///
/// In a scheduled run any fatal error is also sent as a notification.
pub fn cmd_import(config_file: Option<&Path>, args: &ImportArgs) -> anyhow::Result<()> {
    let config = match config::load(config_file) {
        Ok(config) => config,
        Err(e) => {
            if args.is_scheduled_run {
                let notifier = notify::from_config(&NotificationConfig::default());
                notify::send(notifier.as_ref(), "ERROR", &e.to_string());
            }
            return Err(e).context("Failed to load configuration");
        }
    };

    let notifier = notify::from_config(&config.notifications);
    let result = import(&config, args, notifier.as_ref());
    if args.is_scheduled_run
        && let Err(e) = &result
    {
        notify::send(notifier.as_ref(), "ERROR", &format!("{e:#}"));
    }
    result
}

/// Effective policy: config values, overridden by flags for this run.
fn resolve_policy(config: &ImportConfig, args: &ImportArgs) -> ImportConfig {
    let allow_prompt = if args.is_scheduled_run {
        false
    } else {
        flag_pair(args.allow_prompt, args.disallow_prompt).unwrap_or(config.allow_prompt)
    };

    ImportConfig {
        reformat: flag_pair(args.reformat, args.no_reformat).unwrap_or(config.reformat),
        ask_before_disc_update: flag_pair(args.ask_before_disc_update, args.auto_update_disc)
            .unwrap_or(config.ask_before_disc_update),
        ask_before_artist_update: flag_pair(args.ask_before_artist_update, args.auto_update_artist)
            .unwrap_or(config.ask_before_artist_update),
        allow_prompt,
    }
}

fn resolve_mode(args: &ImportArgs) -> ImportMode {
    if args.dry_run {
        ImportMode::DryRun
    } else if args.force || !args.albums.is_empty() {
        ImportMode::Force
    } else {
        ImportMode::Normal
    }
}

fn import(config: &Config, args: &ImportArgs, notifier: &dyn Notifier) -> anyhow::Result<()> {
    let policy = resolve_policy(&config.import, args);
    let mode = resolve_mode(args);
    let ignored: Vec<String> = config.ignored_directories.iter().cloned().collect();

    let library = AnyLibrary::from_config(config).context("Failed to open music library")?;
    let history = HistoryStore::open(&config.history_file);

    let albums = if args.albums.is_empty() {
        if args.format == OutputFormat::Text {
            println!("Importing newly added albums...");
        }
        scanner::discover(&config.shared_directories, &ignored)
    } else {
        args.albums
            .iter()
            .map(|dir| {
                scanner::read_album(dir)
                    .with_context(|| format!("Failed to read album directory {}", dir.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let mut importer = Importer::new(LoftyTagReader, library, history, policy, ignored);
    let mut prompter = StdinPrompter;
    let report = importer.import_albums(&albums, mode, &mut prompter)?;
    print_report(&report, config, args.format)?;

    if args.is_scheduled_run {
        notify_errors(&report, config, notifier);
        return Ok(());
    }

    let offer_retry = mode == ImportMode::Normal
        && policy.allow_prompt
        && args.format == OutputFormat::Text
        && !report.importable_errors.is_empty();
    if !offer_retry {
        return Ok(());
    }

    let selected = select_import_anyway(&report, config, &mut prompter);
    if selected.is_empty() {
        return Ok(());
    }
    let retry: Vec<AlbumCandidate> = albums
        .into_iter()
        .filter(|album| selected.contains(&album.path))
        .collect();

    info!(count = retry.len(), "Importing selected albums anyway");
    let report = importer.import_albums(&retry, ImportMode::Force, &mut prompter)?;
    print_report(&report, config, args.format)
}

fn print_report(report: &ImportReport, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_text(&config.shared_directories)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Tell the user about albums a scheduled run could not import.
fn notify_errors(report: &ImportReport, config: &Config, notifier: &dyn Notifier) {
    let count = report.error_count();
    if count == 0 {
        return;
    }

    let body = report
        .errors_by_kind
        .iter()
        .flat_map(|(kind, albums)| {
            albums
                .iter()
                .map(move |album| format!("{} ({kind})", display_album(album, &config.shared_directories)))
        })
        .collect::<Vec<_>>()
        .join("\n");
    notify::send(notifier, &error_album_message(count), &body);
}

/// Offer to import albums with importable errors anyway.
///
/// Returns the albums the user chose and confirmed.
fn select_import_anyway(
    report: &ImportReport,
    config: &Config,
    prompter: &mut dyn Prompter,
) -> Vec<std::path::PathBuf> {
    let table = report.importable_table();

    println!();
    for (index, album, kind) in &table {
        println!(
            "{index:>3}  {}  ({kind})",
            display_album(album, &config.shared_directories)
        );
    }

    let multiple = table.len() > 1;
    let question = if multiple {
        "Would you like to select one or more albums to import?"
    } else {
        "Would you like to import?"
    };
    if !prompter.confirm(question) {
        return Vec::new();
    }

    let (selected, identifier) = if multiple {
        let answer = prompter.ask(
            "Please input the index of any album(s) you would like to import or the name of\nthe error to import all albums in that category",
        );
        let selected = selection::parse_selection(&answer, &table);
        if selected.is_empty() {
            println!("No matching albums.");
            return Vec::new();
        }
        let identifier = if answer.trim().eq_ignore_ascii_case("all") {
            "all albums"
        } else {
            "these albums"
        };
        (selected, identifier)
    } else {
        let selected = table.iter().map(|(_, album, _)| album.to_path_buf()).collect();
        (selected, "this album")
    };

    println!("You've selected:");
    for album in &selected {
        let name = album
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| album.display().to_string());
        println!("\t\"{name}\"");
    }

    if prompter.confirm(&format!("Are you sure you want to import {identifier}?")) {
        selected
    } else {
        Vec::new()
    }
}
