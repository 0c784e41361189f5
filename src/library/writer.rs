//! Committing one album to the library.
//!
//! An audio commit ingests the album, records it in the history store, then
//! applies its fix plan. A WAV commit opens the folder in the music player
//! and records it. The history store is written exactly once per successful
//! commit and never for a failed one.

use std::path::Path;

use tracing::{info, warn};

use super::{Library, LibraryError, Modification, TrackQuery};
use crate::import::patterns;
use crate::history::{HistoryError, HistoryStore};
use crate::metadata::TagField;
use crate::model::{CommitPath, FixPlan};

/// Why a commit did not complete.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The library rejected the album; nothing was recorded
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// The album is in the library but could not be recorded
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// What a successful commit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Imported through the library. Counts fix modifications that failed.
    Imported { failed_fixes: usize },
    /// Opened in the music player
    WavImported,
}

/// One library modification derived from a fix plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedModification {
    pub query: TrackQuery,
    pub modification: Modification,
}

impl std::fmt::Display for PlannedModification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.query, self.modification)
    }
}

/// Drives a [`Library`] for whole albums.
pub struct LibraryWriter<L> {
    library: L,
}

impl<L: Library> LibraryWriter<L> {
    pub fn new(library: L) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Commit `album` and record it in `history`.
    pub fn commit(
        &mut self,
        album: &Path,
        path: CommitPath,
        plan: Option<&FixPlan>,
        history: &mut HistoryStore,
    ) -> Result<CommitOutcome, CommitError> {
        match path {
            CommitPath::Wav => {
                self.library.open_in_player(album)?;
                history.add(album)?;
                if let Err(e) = self.library.record_in_history(album) {
                    warn!(album = %album.display(), error = %e, "Failed to record WAV import in library history");
                }
                info!(album = %album.display(), "Imported WAV album");
                Ok(CommitOutcome::WavImported)
            }
            CommitPath::Audio => {
                self.library.commit_album(album)?;
                history.add(album)?;
                if let Err(e) = self.library.record_in_history(album) {
                    warn!(album = %album.display(), error = %e, "Failed to record import in library history");
                }

                let failed_fixes = plan.map_or(0, |plan| self.apply(album, plan));
                info!(album = %album.display(), failed_fixes, "Imported album");
                Ok(CommitOutcome::Imported { failed_fixes })
            }
        }
    }

    /// Apply a fix plan, one modification at a time. Returns the failures.
    fn apply(&mut self, album: &Path, plan: &FixPlan) -> usize {
        let mut failed = 0;
        for planned in plan_modifications(plan) {
            if let Err(e) = self.library.modify_tracks(&planned.query, &planned.modification) {
                warn!(
                    album = %album.display(),
                    modification = %planned,
                    error = %e,
                    "Failed to apply fix"
                );
                failed += 1;
            }
        }
        failed
    }
}

/// Library modifications for a plan, in the order they must be applied.
///
/// Year, disc, disc total, comments, album title, artist. Each query names
/// the album title current at that point, so only the artist strip sees a
/// rewritten title.
pub fn plan_modifications(plan: &FixPlan) -> Vec<PlannedModification> {
    let album_query = |title: &str| {
        let query = match &plan.artist {
            Some(artist) => TrackQuery::new().with(artist.field, &artist.value),
            None => TrackQuery::new(),
        };
        query.with(TagField::Album, title)
    };

    let mut planned = Vec::new();
    let mut push = |query, modification| planned.push(PlannedModification { query, modification });

    let mut title = plan.album_title.clone();

    if let Some(year) = &plan.year_override {
        push(album_query(&title), Modification::album(TagField::Year, year));
    }
    if let Some(disc) = &plan.disc_number_override {
        push(album_query(&title), Modification::items(TagField::Disc, disc));
    }
    if let Some(total) = &plan.disc_total_override {
        push(album_query(&title), Modification::album(TagField::DiscTotal, total));
    }

    for comment in &plan.track_comments {
        // Without a title the query would reach every track of the album
        let Some(track_title) = &comment.title else {
            warn!(album = %title, comments = %comment.comments, "Skipping comment fix for untitled track");
            continue;
        };
        let mut query = TrackQuery::new();
        if let Some(artist) = &comment.artist {
            query = query.with(TagField::Artist, artist);
        }
        query = query
            .with(TagField::Album, &title)
            .with(TagField::Title, track_title);
        push(query, Modification::items(TagField::Comments, &comment.comments));
    }

    let mut new_title = title.clone();
    if plan.strip_bracket_year_from_album_title {
        new_title = patterns::strip_bracket_year(&new_title);
    }
    if plan.strip_bracket_disc_from_album_title {
        new_title = patterns::strip_bracket_disc(&new_title);
    }
    if new_title != title {
        push(album_query(&title), Modification::album(TagField::Album, &new_title));
        title = new_title;
    }

    for artist in &plan.artists_to_strip {
        let query = TrackQuery::new()
            .with(TagField::Artist, artist)
            .with(TagField::Album, &title);
        push(
            query,
            Modification::items(TagField::Artist, patterns::strip_solo_instrument(artist)),
        );
    }

    planned
}
