//! Test utilities and fixtures for pileup tests.
//!
//! Provides in-memory stand-ins for the pipeline's collaborators so tests
//! can run whole imports without audio files, a shell or a terminal:
//!
//! - [`FakeTagReader`]: fixed tags per path
//! - [`RecordingLibrary`]: records every library call
//! - [`ScriptedPrompter`]: answers questions from a script
//!
//! # Example
//!
//! ```ignore
//! let album = candidate("/sync/Album", 10, 0);
//! let reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "10"));
//! let mut importer = Importer::new(reader, RecordingLibrary::default(), ...);
//! ```

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::import::Prompter;
use crate::library::{Library, LibraryError, Modification, TrackQuery};
use crate::metadata::{TagError, TagReader, TagSet};
use crate::model::{AlbumCandidate, Track};

/// [`TagReader`] returning fixed tags. Unknown paths are unreadable.
#[derive(Debug, Clone, Default)]
pub struct FakeTagReader {
    tags: HashMap<PathBuf, TagSet>,
}

impl FakeTagReader {
    /// Every supported track of `album` gets `tags`.
    pub fn uniform(album: &AlbumCandidate, tags: TagSet) -> Self {
        let mut reader = Self::default();
        reader.add_uniform(album, tags);
        reader
    }

    /// Every supported track of `album` gets `tags`, numbered titles.
    pub fn add_uniform(&mut self, album: &AlbumCandidate, tags: TagSet) {
        for (n, path) in album.supported_audio.iter().enumerate() {
            let tags = TagSet {
                title: tags.title.clone().or_else(|| Some(format!("Track {}", n + 1))),
                ..tags.clone()
            };
            self.tags.insert(path.clone(), tags);
        }
    }

    pub fn set(&mut self, path: &Path, tags: TagSet) {
        self.tags.insert(path.to_path_buf(), tags);
    }
}

impl TagReader for FakeTagReader {
    fn read(&self, path: &Path) -> Result<TagSet, TagError> {
        self.tags
            .get(path)
            .cloned()
            .ok_or_else(|| TagError::Unreadable {
                path: path.to_path_buf(),
                message: "no fake tags".to_string(),
            })
    }
}

/// [`Library`] that records calls instead of touching anything.
#[derive(Debug, Default)]
pub struct RecordingLibrary {
    pub commits: Vec<PathBuf>,
    /// Rendered query and the modification applied
    pub modifications: Vec<(String, Modification)>,
    pub recorded: Vec<PathBuf>,
    pub opened: Vec<PathBuf>,
    pub fail_commits: bool,
    pub fail_modifications: bool,
    /// Albums whose commit fails as if the path could not be quoted
    pub escape_failures: Vec<PathBuf>,
}

impl Library for RecordingLibrary {
    fn commit_album(&mut self, album: &Path) -> Result<(), LibraryError> {
        if self.escape_failures.iter().any(|p| p == album) {
            return Err(LibraryError::Escape {
                path: album.to_path_buf(),
                reason: "scripted".to_string(),
            });
        }
        if self.fail_commits {
            return Err(LibraryError::Command {
                command: "import".to_string(),
                reason: "scripted".to_string(),
            });
        }
        self.commits.push(album.to_path_buf());
        Ok(())
    }

    fn modify_tracks(
        &mut self,
        query: &TrackQuery,
        modification: &Modification,
    ) -> Result<Option<usize>, LibraryError> {
        if self.fail_modifications {
            return Err(LibraryError::Command {
                command: "modify".to_string(),
                reason: "scripted".to_string(),
            });
        }
        self.modifications.push((query.to_string(), modification.clone()));
        Ok(None)
    }

    fn record_in_history(&mut self, album: &Path) -> Result<(), LibraryError> {
        self.recorded.push(album.to_path_buf());
        Ok(())
    }

    fn open_in_player(&mut self, album: &Path) -> Result<(), LibraryError> {
        self.opened.push(album.to_path_buf());
        Ok(())
    }
}

/// [`Prompter`] answering from a script. Runs out into "no" and "".
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<bool>,
    texts: VecDeque<String>,
    /// Every question asked, in order
    pub questions: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_texts(mut self, texts: impl IntoIterator<Item = &'static str>) -> Self {
        self.texts = texts.into_iter().map(str::to_string).collect();
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn ask(&mut self, question: &str) -> String {
        self.questions.push(question.to_string());
        self.texts.pop_front().unwrap_or_default()
    }
}

/// An album candidate at `path` with `supported` MP3s and `wav` WAVs.
pub fn candidate(path: &str, supported: usize, wav: usize) -> AlbumCandidate {
    let path = PathBuf::from(path);
    AlbumCandidate {
        supported_audio: (1..=supported)
            .map(|n| path.join(format!("{n:02}.mp3")))
            .collect(),
        wav_audio: (1..=wav).map(|n| path.join(format!("{n:02}.wav"))).collect(),
        path,
    }
}

/// Tags of a tidy single-disc album by "Artist".
pub fn album_tags(album: &str, year: &str, track_total: &str) -> TagSet {
    TagSet {
        artist: Some("Artist".to_string()),
        album_title: Some(album.to_string()),
        year: Some(year.to_string()),
        track_total: Some(track_total.to_string()),
        disc_number: Some("1".to_string()),
        disc_total: Some("1".to_string()),
        ..Default::default()
    }
}

/// A track at `path` with `tags`.
pub fn track(path: impl Into<PathBuf>, tags: TagSet) -> Track {
    Track::new(path, tags)
}
