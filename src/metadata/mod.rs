//! Audio file tag reading and writing.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Reads MP3, M4A, FLAC and AIFF. WAV files are never read; discovery keeps
//! them in a separate family.
//!
//! # Features
//! - Read the per-track tags the import pipeline decides on ([`TagSet`])
//! - Rewrite individual fields after an album has been committed
//! - [`TagReader`] seam so tests can substitute fixed tags

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tags of a single track.
///
/// Missing and empty (or whitespace-only) tags are both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub album_artist: Option<String>,
    pub artist: Option<String>,
    pub album_title: Option<String>,
    pub year: Option<String>,
    pub track_total: Option<String>,
    pub disc_number: Option<String>,
    pub disc_total: Option<String>,
    pub title: Option<String>,
    pub comments: Option<String>,
}

impl TagSet {
    /// Value of a single field.
    pub fn get(&self, field: TagField) -> Option<&str> {
        let value = match field {
            TagField::AlbumArtist => &self.album_artist,
            TagField::Artist => &self.artist,
            TagField::Album => &self.album_title,
            TagField::Year => &self.year,
            TagField::TrackTotal => &self.track_total,
            TagField::Disc => &self.disc_number,
            TagField::DiscTotal => &self.disc_total,
            TagField::Title => &self.title,
            TagField::Comments => &self.comments,
        };
        value.as_deref()
    }

    /// Normalize every field: trim, and turn empty strings into `None`.
    pub fn normalized(self) -> Self {
        Self {
            album_artist: normalize(self.album_artist),
            artist: normalize(self.artist),
            album_title: normalize(self.album_title),
            year: normalize(self.year),
            track_total: normalize(self.track_total),
            disc_number: normalize(self.disc_number),
            disc_total: normalize(self.disc_total),
            title: normalize(self.title),
            comments: normalize(self.comments),
        }
    }
}

/// A tag field, named the way library queries name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagField {
    AlbumArtist,
    Artist,
    Album,
    Year,
    TrackTotal,
    Disc,
    DiscTotal,
    Title,
    Comments,
}

impl TagField {
    /// Field name in query and modification syntax (`album::^x$`, `year=2020`).
    pub fn query_name(self) -> &'static str {
        match self {
            TagField::AlbumArtist => "albumartist",
            TagField::Artist => "artist",
            TagField::Album => "album",
            TagField::Year => "year",
            TagField::TrackTotal => "tracktotal",
            TagField::Disc => "disc",
            TagField::DiscTotal => "disctotal",
            TagField::Title => "title",
            TagField::Comments => "comments",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_name())
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tag reading/writing errors
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// Not a recognizable audio container, or not readable at all
    #[error("Unreadable audio file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    /// A numeric field was given a non-numeric value
    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: TagField, value: String },

    /// Tags could not be saved back to the file
    #[error("Failed to write tags to {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl TagError {
    fn unreadable(path: &Path, err: impl fmt::Display) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Source of per-track tags.
///
/// Implement this trait to substitute fixed tags in tests.
pub trait TagReader {
    /// Read the tags of one file. Absent tags are `None`, never an error.
    fn read(&self, path: &Path) -> Result<TagSet, TagError>;
}

/// [`TagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TagSet, TagError> {
        read(path)
    }
}

/// Read the tags of an audio file.
pub fn read(path: &Path) -> Result<TagSet, TagError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| TagError::unreadable(path, e))?
        .read()
        .map_err(|e| TagError::unreadable(path, e))?;

    // Get the primary tag, or fall back to the first available tag
    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    else {
        return Ok(TagSet::default());
    };

    let tags = TagSet {
        album_artist: tag.get_string(&ItemKey::AlbumArtist).map(str::to_string),
        artist: tag.artist().map(|s| s.to_string()),
        album_title: tag.album().map(|s| s.to_string()),
        year: tag.year().map(|y| y.to_string()),
        track_total: tag.track_total().map(|n| n.to_string()),
        disc_number: tag.disk().map(|n| n.to_string()),
        disc_total: tag.disk_total().map(|n| n.to_string()),
        title: tag.title().map(|s| s.to_string()),
        comments: tag.comment().map(|s| s.to_string()),
    };

    Ok(tags.normalized())
}

/// Rewrite the given fields of an audio file.
///
/// Returns the number of fields written. Numeric fields must parse as
/// unsigned integers; nothing is saved if any value is invalid.
pub fn write(path: &Path, changes: &[(TagField, &str)]) -> Result<usize, TagError> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| TagError::unreadable(path, e))?
        .read()
        .map_err(|e| TagError::unreadable(path, e))?;

    // Get the primary tag type for this format, or create one
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(TagError::Write {
            path: path.to_path_buf(),
            message: format!("no {tag_type:?} tag available"),
        });
    };

    for &(field, value) in changes {
        apply_change(tag, field, value)?;
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TagError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(changes.len())
}

fn apply_change(tag: &mut Tag, field: TagField, value: &str) -> Result<(), TagError> {
    let number = || {
        value.trim().parse::<u32>().map_err(|_| TagError::InvalidValue {
            field,
            value: value.to_string(),
        })
    };

    match field {
        TagField::AlbumArtist => {
            tag.insert_text(ItemKey::AlbumArtist, value.to_string());
        }
        TagField::Artist => tag.set_artist(value.to_string()),
        TagField::Album => tag.set_album(value.to_string()),
        TagField::Title => tag.set_title(value.to_string()),
        TagField::Comments => tag.set_comment(value.to_string()),
        TagField::Year => tag.set_year(number()?),
        TagField::TrackTotal => tag.set_track_total(number()?),
        TagField::Disc => tag.set_disk(number()?),
        TagField::DiscTotal => tag.set_disk_total(number()?),
    }
    Ok(())
}
