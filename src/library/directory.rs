//! Plain directory backend.
//!
//! Copies an album's audio files into `<root>/<artist>/<album>/` and edits
//! the copies' tags with lofty. Existing files are never overwritten: a
//! clashing name gets a `__N` suffix before its extension.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Library, LibraryError, Modification, TrackQuery};
use crate::metadata::{self, TagField};
use crate::scanner::{AudioFamily, audio_family};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A [`Library`] that is a directory tree of audio files.
#[derive(Debug)]
pub struct DirectoryLibrary {
    root: PathBuf,
    music_player: String,
    /// Files copied during this run; modifications only touch these
    copied: Vec<PathBuf>,
}

impl DirectoryLibrary {
    /// Open the library rooted at `root`, which must exist.
    pub fn open(root: &Path, music_player: &str) -> Result<Self, LibraryError> {
        if !root.is_dir() {
            return Err(LibraryError::DestinationMissing(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            music_player: music_player.to_string(),
            copied: Vec::new(),
        })
    }

    /// Files copied into the library so far.
    pub fn copied(&self) -> &[PathBuf] {
        &self.copied
    }

    /// Destination directory for an album, from the tags of its first track.
    fn destination(&self, tracks: &[PathBuf], album: &Path) -> PathBuf {
        let tags = tracks.first().and_then(|track| match metadata::read(track) {
            Ok(tags) => Some(tags),
            Err(e) => {
                debug!(target: "library::directory", error = %e, "Falling back to folder name");
                None
            }
        });

        let artist = tags
            .as_ref()
            .and_then(|t| t.get(TagField::AlbumArtist).or(t.get(TagField::Artist)))
            .unwrap_or(UNKNOWN_ARTIST);
        let folder_name = album.file_name().map(|name| name.to_string_lossy());
        let album_title = tags
            .as_ref()
            .and_then(|t| t.get(TagField::Album))
            .or(folder_name.as_deref())
            .unwrap_or(UNKNOWN_ALBUM);

        self.root
            .join(sanitize_component(artist))
            .join(sanitize_component(album_title))
    }
}

impl Library for DirectoryLibrary {
    fn commit_album(&mut self, album: &Path) -> Result<(), LibraryError> {
        let mut tracks: Vec<PathBuf> = fs::read_dir(album)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        tracks.retain(|path| path.is_file() && audio_family(path) == AudioFamily::Supported);
        tracks.sort();

        let destination = self.destination(&tracks, album);
        fs::create_dir_all(&destination)?;
        info!(target: "library::directory", album = %album.display(), destination = %destination.display(), "Copying album");

        for track in &tracks {
            let Some(file_name) = track.file_name() else {
                continue;
            };
            let target = unique_path(&destination.join(file_name));
            fs::copy(track, &target)?;
            debug!(target: "library::directory", file = %target.display(), "Copied");
            self.copied.push(target);
        }
        Ok(())
    }

    fn modify_tracks(
        &mut self,
        query: &TrackQuery,
        modification: &Modification,
    ) -> Result<Option<usize>, LibraryError> {
        let mut modified = 0;
        for path in &self.copied {
            let tags = match metadata::read(path) {
                Ok(tags) => tags,
                Err(e) => {
                    warn!(target: "library::directory", error = %e, "Skipping unreadable track");
                    continue;
                }
            };
            if !query.matches(&tags) {
                continue;
            }
            metadata::write(path, &[(modification.field, modification.value.as_str())])?;
            modified += 1;
        }

        debug!(target: "library::directory", query = %query, modification = %modification, modified, "Modified tracks");
        Ok(Some(modified))
    }

    fn record_in_history(&mut self, album: &Path) -> Result<(), LibraryError> {
        debug!(target: "library::directory", album = %album.display(), "No library history to update");
        Ok(())
    }

    fn open_in_player(&mut self, album: &Path) -> Result<(), LibraryError> {
        info!(target: "library::directory", album = %album.display(), player = %self.music_player, "Opening album in music player");
        super::open_in_player(&self.music_player, album)
    }
}

/// Make a tag value safe to use as one path component.
fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            _ => c,
        })
        .collect();

    match sanitized.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// `path`, or the first free `stem__N.ext` next to it.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}__{n}.{ext}"),
                None => format!("{stem}__{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
