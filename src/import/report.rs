//! Aggregate outcome of an import run.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::{CommitPath, ErrorKind};

/// An album a dry run would have imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedImport {
    pub album: PathBuf,
    pub wav: bool,
    /// Modifications that would follow the commit, rendered as query and
    /// assignment
    pub fixes: Vec<String>,
}

/// Outcome of one pass over a set of albums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// At least one album went through the library's import
    pub imports_made: bool,
    pub wav_imports: usize,
    pub skipped_already_imported: usize,
    pub skipped_needs_prompt: usize,
    pub ignored: usize,
    pub errors_by_kind: BTreeMap<ErrorKind, Vec<PathBuf>>,
    /// Albums whose error may be overridden in Force mode, in run order
    pub importable_errors: Vec<PathBuf>,
    /// Albums committed during the run
    pub imported: Vec<PathBuf>,
    /// Dry runs only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub would_import: Vec<PlannedImport>,
}

impl ImportReport {
    pub fn record_error(&mut self, kind: ErrorKind, album: &Path) {
        self.errors_by_kind
            .entry(kind)
            .or_default()
            .push(album.to_path_buf());
        if kind == ErrorKind::SkippedNeedsPrompt {
            self.skipped_needs_prompt += 1;
        }
        if kind.is_importable() {
            self.importable_errors.push(album.to_path_buf());
        }
    }

    pub fn record_import(&mut self, album: &Path, path: CommitPath) {
        match path {
            CommitPath::Audio => self.imports_made = true,
            CommitPath::Wav => self.wav_imports += 1,
        }
        self.imported.push(album.to_path_buf());
    }

    /// Number of albums in any error bucket.
    pub fn error_count(&self) -> usize {
        self.errors_by_kind.values().map(Vec::len).sum()
    }

    /// Importable albums with their error, numbered from 1 in bucket order.
    pub fn importable_table(&self) -> Vec<(usize, &Path, ErrorKind)> {
        self.errors_by_kind
            .iter()
            .filter(|(kind, _)| kind.is_importable())
            .flat_map(|(kind, albums)| albums.iter().map(move |album| (album.as_path(), *kind)))
            .enumerate()
            .map(|(index, (album, kind))| (index + 1, album, kind))
            .collect()
    }

    /// Human-readable summary. Album paths are shown relative to the
    /// shared directory they were found in.
    pub fn render_text(&self, shared_directories: &BTreeSet<PathBuf>) -> String {
        let mut out = String::new();

        if self.wav_imports > 0 {
            let _ = writeln!(
                out,
                "Imported {} {} in WAV format.",
                self.wav_imports,
                plural(self.wav_imports, "album")
            );
        }
        let _ = writeln!(
            out,
            "Skipped {} previously imported {}.",
            self.skipped_already_imported,
            plural(self.skipped_already_imported, "album")
        );
        if self.skipped_needs_prompt > 0 {
            let _ = writeln!(
                out,
                "Skipped {} {} requiring prompt.",
                self.skipped_needs_prompt,
                plural(self.skipped_needs_prompt, "album")
            );
        }

        for planned in &self.would_import {
            let kind = if planned.wav { " (WAV)" } else { "" };
            let _ = writeln!(out, "Would import{kind}: {}", display_album(&planned.album, shared_directories));
            for fix in &planned.fixes {
                let _ = writeln!(out, "    {fix}");
            }
        }

        let errors = self.error_count();
        if errors > 0 {
            let _ = writeln!(out, "\n{}:", error_album_message(errors));
            for (kind, albums) in &self.errors_by_kind {
                let _ = writeln!(out, "  {kind}");
                for album in albums {
                    let _ = writeln!(out, "    {}", display_album(album, shared_directories));
                }
            }
        }

        out
    }
}

/// `"N album(s) cannot be automatically imported"`
pub fn error_album_message(count: usize) -> String {
    format!("{count} {} cannot be automatically imported", plural(count, "album"))
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

/// Album path relative to the shared directory containing it.
pub fn display_album(album: &Path, shared_directories: &BTreeSet<PathBuf>) -> String {
    shared_directories
        .iter()
        .find_map(|dir| album.strip_prefix(dir).ok())
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or(album)
        .display()
        .to_string()
}
