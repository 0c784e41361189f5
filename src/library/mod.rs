//! The music library albums are imported into.
//!
//! The import pipeline only talks to the library through the [`Library`]
//! trait: commit an album directory, modify tags of tracks matching a query,
//! and record an import in the library's own history. Two backends exist:
//!
//! - [`BeetsLibrary`]: shells out to the `beet` command line tool
//! - [`DirectoryLibrary`]: copies files into a local directory and edits
//!   their tags in place
//!
//! [`LibraryWriter`] drives a backend for one album: commit, history, fixes.

mod beets;
mod directory;
pub mod shell;
mod writer;

pub use beets::BeetsLibrary;
pub use directory::DirectoryLibrary;
pub use writer::{CommitError, CommitOutcome, LibraryWriter, PlannedModification, plan_modifications};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Config, LibraryBackend};
use crate::metadata::{TagError, TagField, TagSet};

/// Library backend errors
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// The album path cannot be quoted for the shell
    #[error("Cannot quote album path {path}: {reason}")]
    Escape { path: PathBuf, reason: String },

    /// An external command could not be started or failed
    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    /// The local library directory does not exist
    #[error("Library directory does not exist: {0}")]
    DestinationMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tag(#[from] TagError),
}

impl LibraryError {
    pub fn is_escape(&self) -> bool {
        matches!(self, LibraryError::Escape { .. })
    }
}

/// Capability the import pipeline needs from a music library.
pub trait Library {
    /// Ingest the audio files of an album directory.
    fn commit_album(&mut self, album: &Path) -> Result<(), LibraryError>;

    /// Apply one modification to every track matching `query`.
    ///
    /// Returns the number of tracks (or albums) modified when the backend
    /// knows it.
    fn modify_tracks(
        &mut self,
        query: &TrackQuery,
        modification: &Modification,
    ) -> Result<Option<usize>, LibraryError>;

    /// Note an album in the library's own import history.
    fn record_in_history(&mut self, album: &Path) -> Result<(), LibraryError>;

    /// Open an album folder in the configured music player.
    fn open_in_player(&mut self, album: &Path) -> Result<(), LibraryError>;
}

/// A library backend selected by configuration.
pub enum AnyLibrary {
    Beets(BeetsLibrary),
    Directory(DirectoryLibrary),
}

impl AnyLibrary {
    /// Build the configured backend.
    ///
    /// The directory backend requires its destination to exist.
    pub fn from_config(config: &Config) -> Result<Self, LibraryError> {
        match config.library.backend {
            LibraryBackend::Beets => Ok(AnyLibrary::Beets(BeetsLibrary::new(
                &config.library.beet_command,
                &config.music_player,
            ))),
            LibraryBackend::Directory => Ok(AnyLibrary::Directory(DirectoryLibrary::open(
                &config.local_directory,
                &config.music_player,
            )?)),
        }
    }

    fn inner(&mut self) -> &mut dyn Library {
        match self {
            AnyLibrary::Beets(library) => library,
            AnyLibrary::Directory(library) => library,
        }
    }
}

impl Library for AnyLibrary {
    fn commit_album(&mut self, album: &Path) -> Result<(), LibraryError> {
        self.inner().commit_album(album)
    }

    fn modify_tracks(
        &mut self,
        query: &TrackQuery,
        modification: &Modification,
    ) -> Result<Option<usize>, LibraryError> {
        self.inner().modify_tracks(query, modification)
    }

    fn record_in_history(&mut self, album: &Path) -> Result<(), LibraryError> {
        self.inner().record_in_history(album)
    }

    fn open_in_player(&mut self, album: &Path) -> Result<(), LibraryError> {
        self.inner().open_in_player(album)
    }
}

/// One `field::^value$` term of a [`TrackQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub field: TagField,
    /// Raw, unescaped value
    pub value: String,
}

impl QueryTerm {
    /// Anchored regex matching exactly `value`.
    pub fn pattern(&self) -> String {
        format!("^{}$", regex::escape(&self.value))
    }

    /// Whether a track's tags satisfy this term.
    pub fn matches(&self, tags: &TagSet) -> bool {
        // An escaped, anchored pattern matches exactly its own value
        tags.get(self.field) == Some(self.value.as_str())
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.field, self.pattern())
    }
}

/// Selects tracks by exact tag values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackQuery {
    terms: Vec<QueryTerm>,
}

impl TrackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term requiring `field` to equal `value`.
    pub fn with(mut self, field: TagField, value: impl Into<String>) -> Self {
        self.terms.push(QueryTerm {
            field,
            value: value.into(),
        });
        self
    }

    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    /// Terms in command line syntax, e.g. `album::^Album \[2020\]$`.
    pub fn to_args(&self) -> Vec<String> {
        self.terms.iter().map(ToString::to_string).collect()
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        self.terms.iter().all(|term| term.matches(tags))
    }
}

impl fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

/// Whether a modification applies to whole albums or to single tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyScope {
    Album,
    Items,
}

/// Set one field to a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub field: TagField,
    pub value: String,
    pub scope: ModifyScope,
}

impl Modification {
    pub fn album(field: TagField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            scope: ModifyScope::Album,
        }
    }

    pub fn items(field: TagField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            scope: ModifyScope::Items,
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// Open `album` with `music_player`, without a shell.
///
/// On macOS the player is an application name handed to `open -a`;
/// elsewhere it is an executable.
pub(crate) fn open_in_player(music_player: &str, album: &Path) -> Result<(), LibraryError> {
    let mut command = if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg("-a").arg(music_player);
        command
    } else {
        Command::new(music_player)
    };
    command.arg(album);

    run_command(&mut command, &format!("{music_player} {}", album.display()))
}

/// Run a command to completion, mapping failure to [`LibraryError::Command`].
pub(crate) fn run_command(command: &mut Command, display: &str) -> Result<(), LibraryError> {
    let status = command.status().map_err(|e| LibraryError::Command {
        command: display.to_string(),
        reason: e.to_string(),
    })?;
    if !status.success() {
        return Err(LibraryError::Command {
            command: display.to_string(),
            reason: status.to_string(),
        });
    }
    Ok(())
}
