//! Core data model of the import pipeline.
//!
//! Defines the entities that flow from discovery to the library:
//! [`AlbumCandidate`] (a leaf directory), [`Track`] (a file plus its tags),
//! the [`Verdict`] the classifier reaches, and the [`FixPlan`] applied after
//! a commit. None of these outlive a single run; only album paths are
//! persisted, by the history store.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::metadata::TagSet;

/// A leaf directory found during discovery, with its audio files split by
/// family. Paths are absolute and sorted by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumCandidate {
    /// Album identity
    pub path: PathBuf,
    /// MP3, M4A, FLAC and AIFF files
    pub supported_audio: Vec<PathBuf>,
    /// WAV files
    pub wav_audio: Vec<PathBuf>,
}

impl AlbumCandidate {
    /// Whether the directory holds any audio at all.
    pub fn has_audio(&self) -> bool {
        !self.supported_audio.is_empty() || !self.wav_audio.is_empty()
    }
}

/// A readable audio file and its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub tags: TagSet,
}

impl Track {
    pub fn new(path: impl Into<PathBuf>, tags: TagSet) -> Self {
        Self {
            path: path.into(),
            tags,
        }
    }
}

/// Value of a tag that should be identical on every track of an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumWideTag<T> {
    /// No track has the tag
    Absent,
    /// Every track has the same value
    Unique(T),
    /// Tracks disagree, or some tracks lack the tag. Holds the distinct
    /// present values in track order.
    Conflicting(Vec<T>),
}

impl AlbumWideTag<String> {
    /// Collect the album-wide value of one tag across tracks.
    pub fn collect<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut distinct: Vec<String> = Vec::new();
        let mut missing = false;

        for value in values {
            match value {
                Some(v) => {
                    if !distinct.iter().any(|d| d == v) {
                        distinct.push(v.to_string());
                    }
                }
                None => missing = true,
            }
        }

        match distinct.len() {
            0 => AlbumWideTag::Absent,
            1 if !missing => AlbumWideTag::Unique(distinct.remove(0)),
            _ => AlbumWideTag::Conflicting(distinct),
        }
    }
}

impl<T> AlbumWideTag<T> {
    /// The unique value, if all tracks agree.
    pub fn unique(&self) -> Option<&T> {
        match self {
            AlbumWideTag::Unique(value) => Some(value),
            _ => None,
        }
    }

    /// First present value in track order ("first wins").
    pub fn first(&self) -> Option<&T> {
        match self {
            AlbumWideTag::Absent => None,
            AlbumWideTag::Unique(value) => Some(value),
            AlbumWideTag::Conflicting(values) => values.first(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AlbumWideTag::Absent)
    }
}

/// Why an album could not be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EscapeError,
    ConflictingTrackTotals,
    MissingTrackTotal,
    MissingTracks,
    NoTracks,
    WavOnly,
    MissingAlbumTitle,
    SkippedNeedsPrompt,
    /// The library rejected the album for a reason other than quoting
    CommitFailed,
}

impl ErrorKind {
    /// Every kind, in report order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::EscapeError,
        ErrorKind::ConflictingTrackTotals,
        ErrorKind::MissingTrackTotal,
        ErrorKind::MissingTracks,
        ErrorKind::NoTracks,
        ErrorKind::WavOnly,
        ErrorKind::MissingAlbumTitle,
        ErrorKind::SkippedNeedsPrompt,
        ErrorKind::CommitFailed,
    ];

    /// Whether the user may retry an album with this error in Force mode.
    pub fn is_importable(self) -> bool {
        matches!(
            self,
            ErrorKind::ConflictingTrackTotals
                | ErrorKind::MissingTrackTotal
                | ErrorKind::MissingTracks
                | ErrorKind::WavOnly
        )
    }

    /// Human-readable label, also accepted when selecting albums by error.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::EscapeError => "escape error",
            ErrorKind::ConflictingTrackTotals => "conflicting track totals",
            ErrorKind::MissingTrackTotal => "missing track total",
            ErrorKind::MissingTracks => "missing tracks",
            ErrorKind::NoTracks => "no tracks",
            ErrorKind::WavOnly => "wav files",
            ErrorKind::MissingAlbumTitle => "missing album title",
            ErrorKind::SkippedNeedsPrompt => "needs prompt",
            ErrorKind::CommitFailed => "commit failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the classifier decides an album is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    #[default]
    Normal,
    /// Bypass history and the importable error gates; commit WAV albums
    Force,
    /// Classify and plan, but never commit or prompt
    DryRun,
}

/// Which physical commit an importable album takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPath {
    /// Hand the directory to the library's import action
    Audio,
    /// Open the folder in the music player (Force mode only)
    Wav,
}

/// The artist term a post-import query starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistTerm {
    /// `albumartist` or `artist`
    pub field: crate::metadata::TagField,
    pub value: String,
}

/// Comments to write on one track after import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackComment {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Full new comments value (existing comments plus appended notes)
    pub comments: String,
}

/// Metadata mutations applied to an album after it has been committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixPlan {
    /// Album title as tagged when the plan was made
    pub album_title: String,
    /// Artist term of every album-level query
    pub artist: Option<ArtistTerm>,
    pub year_override: Option<String>,
    pub disc_number_override: Option<String>,
    pub disc_total_override: Option<String>,
    pub strip_bracket_year_from_album_title: bool,
    pub strip_bracket_disc_from_album_title: bool,
    /// Artist values holding a bracketed solo instrument annotation
    pub artists_to_strip: Vec<String>,
    pub track_comments: Vec<TrackComment>,
}

impl FixPlan {
    /// A plan for `album_title` that changes nothing.
    pub fn empty(album_title: impl Into<String>, artist: Option<ArtistTerm>) -> Self {
        Self {
            album_title: album_title.into(),
            artist,
            ..Default::default()
        }
    }

    /// Whether applying the plan would change any tag.
    pub fn is_empty(&self) -> bool {
        self.year_override.is_none()
            && self.disc_number_override.is_none()
            && self.disc_total_override.is_none()
            && !self.strip_bracket_year_from_album_title
            && !self.strip_bracket_disc_from_album_title
            && self.artists_to_strip.is_empty()
            && self.track_comments.is_empty()
    }
}

/// The classifier's decision for one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Ready to ingest as-is
    Import(CommitPath),
    /// Ingest, then apply the plan
    ImportWithFixes(FixPlan),
    /// Not ingestable
    Error(ErrorKind),
    /// Already in the history store
    AlreadyImported,
    /// Matched an ignored path
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_wide_unique() {
        let tag = AlbumWideTag::collect([Some("10"), Some("10"), Some("10")]);
        assert_eq!(tag, AlbumWideTag::Unique("10".to_string()));
        assert_eq!(tag.unique().map(String::as_str), Some("10"));
    }

    #[test]
    fn test_album_wide_absent() {
        let tag = AlbumWideTag::collect([None, None]);
        assert!(tag.is_absent());
        assert_eq!(tag.first(), None);
    }

    #[test]
    fn test_album_wide_conflicting_keeps_track_order() {
        let tag = AlbumWideTag::collect([Some("B"), Some("A"), Some("B")]);
        assert_eq!(
            tag,
            AlbumWideTag::Conflicting(vec!["B".to_string(), "A".to_string()])
        );
        assert_eq!(tag.first().map(String::as_str), Some("B"));
        assert_eq!(tag.unique(), None);
    }

    #[test]
    fn test_album_wide_partially_missing_is_conflicting() {
        let tag = AlbumWideTag::collect([Some("10"), None]);
        assert_eq!(tag, AlbumWideTag::Conflicting(vec!["10".to_string()]));
    }

    #[test]
    fn test_importable_kinds() {
        let importable: Vec<_> = ErrorKind::ALL
            .into_iter()
            .filter(|k| k.is_importable())
            .collect();
        assert_eq!(
            importable,
            vec![
                ErrorKind::ConflictingTrackTotals,
                ErrorKind::MissingTrackTotal,
                ErrorKind::MissingTracks,
                ErrorKind::WavOnly,
            ]
        );
    }

    #[test]
    fn test_empty_plan() {
        let plan = FixPlan::empty("Album", None);
        assert!(plan.is_empty());

        let plan = FixPlan {
            year_override: Some("2020".to_string()),
            ..FixPlan::empty("Album", None)
        };
        assert!(!plan.is_empty());
    }
}
