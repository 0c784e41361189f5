//! The import loop.
//!
//! Albums are processed one at a time, in the order given: classify, then
//! commit if importable. Per-album failures end up in the [`ImportReport`];
//! only a history store that cannot be written stops the run, since every
//! later commit would go unrecorded.

use std::path::Path;

use tracing::{info, warn};

use super::classifier::Classifier;
use super::prompt::Prompter;
use super::report::{ImportReport, PlannedImport};
use crate::config::ImportConfig;
use crate::history::{HistoryError, HistoryStore};
use crate::library::{CommitError, CommitOutcome, Library, LibraryWriter, plan_modifications};
use crate::metadata::TagReader;
use crate::model::{AlbumCandidate, CommitPath, ErrorKind, FixPlan, ImportMode, Verdict};

/// Runs imports against one library and history store.
pub struct Importer<R, L> {
    reader: R,
    writer: LibraryWriter<L>,
    history: HistoryStore,
    policy: ImportConfig,
    ignored: Vec<String>,
}

impl<R: TagReader, L: Library> Importer<R, L> {
    pub fn new(
        reader: R,
        library: L,
        history: HistoryStore,
        policy: ImportConfig,
        ignored: Vec<String>,
    ) -> Self {
        Self {
            reader,
            writer: LibraryWriter::new(library),
            history,
            policy,
            ignored,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn library(&self) -> &L {
        self.writer.library()
    }

    /// Import `albums` in order and report the outcome.
    pub fn import_albums(
        &mut self,
        albums: &[AlbumCandidate],
        mode: ImportMode,
        prompter: &mut dyn Prompter,
    ) -> Result<ImportReport, HistoryError> {
        let classifier = Classifier::new(&self.reader, mode, self.policy, &self.ignored);
        let mut report = ImportReport::default();

        info!(count = albums.len(), mode = ?mode, "Importing albums");

        for album in albums {
            let verdict = classifier.classify(album, &self.history, prompter);
            let (path, plan) = match verdict {
                Verdict::AlreadyImported => {
                    report.skipped_already_imported += 1;
                    continue;
                }
                Verdict::Ignored => {
                    report.ignored += 1;
                    continue;
                }
                Verdict::Error(kind) => {
                    report.record_error(kind, &album.path);
                    continue;
                }
                Verdict::Import(path) => (path, None),
                Verdict::ImportWithFixes(plan) => (CommitPath::Audio, Some(plan)),
            };

            if mode == ImportMode::DryRun {
                report.would_import.push(planned_import(&album.path, path, plan.as_ref()));
                continue;
            }

            match self.writer.commit(&album.path, path, plan.as_ref(), &mut self.history) {
                Ok(CommitOutcome::Imported { .. }) => report.record_import(&album.path, CommitPath::Audio),
                Ok(CommitOutcome::WavImported) => report.record_import(&album.path, CommitPath::Wav),
                Err(CommitError::Library(e)) => {
                    warn!(album = %album.path.display(), error = %e, "Import failed");
                    let kind = if e.is_escape() {
                        ErrorKind::EscapeError
                    } else {
                        ErrorKind::CommitFailed
                    };
                    report.record_error(kind, &album.path);
                }
                Err(CommitError::History(e)) => return Err(e),
            }
        }

        self.history.flush()?;
        info!(
            imported = report.imported.len(),
            errors = report.error_count(),
            skipped = report.skipped_already_imported,
            "Import finished"
        );
        Ok(report)
    }
}

fn planned_import(album: &Path, path: CommitPath, plan: Option<&FixPlan>) -> PlannedImport {
    PlannedImport {
        album: album.to_path_buf(),
        wav: path == CommitPath::Wav,
        fixes: plan
            .map(|plan| plan_modifications(plan).iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
    }
}
