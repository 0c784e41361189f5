//! beets backend.
//!
//! `beet import` is interactive, so it runs through `sh -c` with the
//! terminal attached. Modifications run `beet modify --yes` directly.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use super::{Library, LibraryError, Modification, ModifyScope, TrackQuery, shell};

/// A [`Library`] backed by the `beet` command.
#[derive(Debug, Clone)]
pub struct BeetsLibrary {
    beet_command: String,
    music_player: String,
}

impl BeetsLibrary {
    pub fn new(beet_command: &str, music_player: &str) -> Self {
        Self {
            beet_command: beet_command.to_string(),
            music_player: music_player.to_string(),
        }
    }

    /// Shell command line importing `album`.
    pub fn import_command(&self, album: &Path) -> Result<String, LibraryError> {
        Ok(format!("{} import {}", self.beet_command, shell::quote_path(album)?))
    }

    /// Argument vector modifying tracks matching `query`.
    pub fn modify_args(&self, query: &TrackQuery, modification: &Modification) -> Vec<String> {
        let mut args: Vec<String> = self
            .beet_command
            .split_whitespace()
            .map(str::to_string)
            .collect();
        args.push("modify".to_string());
        args.push("--yes".to_string());
        if modification.scope == ModifyScope::Album {
            args.push("--album".to_string());
        }
        args.extend(query.to_args());
        args.push(modification.to_string());
        args
    }
}

impl Library for BeetsLibrary {
    fn commit_album(&mut self, album: &Path) -> Result<(), LibraryError> {
        let command_line = self.import_command(album)?;
        info!(target: "library::beets", album = %album.display(), "Importing album");
        debug!(target: "library::beets", command = %command_line, "Running beet import");

        super::run_command(Command::new("sh").arg("-c").arg(&command_line), &command_line)
    }

    fn modify_tracks(
        &mut self,
        query: &TrackQuery,
        modification: &Modification,
    ) -> Result<Option<usize>, LibraryError> {
        let args = self.modify_args(query, modification);
        let display_cmd = args.join(" ");
        let Some((program, rest)) = args.split_first() else {
            return Err(LibraryError::Command {
                command: display_cmd,
                reason: "beet command is empty".to_string(),
            });
        };

        debug!(target: "library::beets", command = %display_cmd, "Running beet modify");
        super::run_command(Command::new(program).args(rest), &display_cmd)?;
        Ok(None)
    }

    fn record_in_history(&mut self, album: &Path) -> Result<(), LibraryError> {
        // beet import keeps its own history; nothing else to update
        debug!(target: "library::beets", album = %album.display(), "Recorded in beets history by import");
        Ok(())
    }

    fn open_in_player(&mut self, album: &Path) -> Result<(), LibraryError> {
        info!(target: "library::beets", album = %album.display(), player = %self.music_player, "Opening album in music player");
        super::open_in_player(&self.music_player, album)
    }
}
