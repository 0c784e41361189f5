//! Album discovery in shared directories.
//!
//! An album candidate is a leaf directory: it holds at least one file and
//! no subdirectories. Its files are split into supported audio (mp3, m4a,
//! flac, aif/aiff/aifc; case-insensitive), WAV, and everything else.
//!
//! Discovery is depth-first with entries sorted by file name, so the yield
//! order is stable between runs. It never consults the import history.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::model::AlbumCandidate;

/// Which family an audio file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFamily {
    Supported,
    Wav,
    Other,
}

/// Classify a file by its extension.
pub fn audio_family(path: &Path) -> AudioFamily {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("mp3" | "m4a" | "flac" | "aif" | "aiff" | "aifc") => AudioFamily::Supported,
        Some("wav") => AudioFamily::Wav,
        _ => AudioFamily::Other,
    }
}

/// Whether `path` contains any of the ignored substrings.
pub fn is_ignored<'a>(path: &Path, ignored: impl IntoIterator<Item = &'a String>) -> bool {
    let path = path.to_string_lossy();
    ignored
        .into_iter()
        .any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
}

/// Walk every root and collect album candidates.
///
/// Roots themselves are never candidates. Roots that do not exist are
/// logged and skipped. A directory reachable from two roots is yielded once.
pub fn discover<'a>(
    roots: impl IntoIterator<Item = &'a PathBuf>,
    ignored: &[String],
) -> Vec<AlbumCandidate> {
    let mut seen = HashSet::new();
    let mut albums = Vec::new();

    let roots: Vec<PathBuf> = roots
        .into_iter()
        .filter_map(|root| match std::path::absolute(root) {
            Ok(root) => Some(root),
            Err(e) => {
                warn!(target: "import::discover", root = %root.display(), error = %e, "Invalid shared directory");
                None
            }
        })
        .collect();

    for root in &roots {
        if !root.is_dir() {
            warn!(target: "import::discover", root = %root.display(), "Shared directory does not exist");
            continue;
        }

        for entry in WalkDir::new(root).sort_by_file_name().into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(target: "import::discover", error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_dir() || roots.iter().any(|r| r == path) {
                continue;
            }

            let candidate = match read_leaf(path) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    warn!(target: "import::discover", dir = %path.display(), error = %e, "Failed to list directory");
                    continue;
                }
            };

            if is_ignored(&candidate.path, ignored) {
                debug!(target: "import::discover", album = %candidate.path.display(), "Ignored");
                continue;
            }

            if seen.insert(candidate.path.clone()) {
                albums.push(candidate);
            }
        }
    }

    debug!(target: "import::discover", count = albums.len(), "Discovery complete");
    albums
}

/// Read a directory as an album candidate, whatever its shape.
///
/// Used for albums named explicitly on the command line, where the leaf
/// rule does not apply.
pub fn read_album(dir: &Path) -> std::io::Result<AlbumCandidate> {
    let dir = std::path::absolute(dir)?;
    let (files, _) = list_dir(&dir)?;
    Ok(partition(dir, files))
}

/// Read `dir` as a candidate if it is a non-empty leaf directory.
fn read_leaf(dir: &Path) -> std::io::Result<Option<AlbumCandidate>> {
    let (files, has_subdirs) = list_dir(dir)?;
    if files.is_empty() || has_subdirs {
        return Ok(None);
    }
    Ok(Some(partition(dir.to_path_buf(), files)))
}

fn list_dir(dir: &Path) -> std::io::Result<(Vec<PathBuf>, bool)> {
    let mut files = Vec::new();
    let mut has_subdirs = false;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            has_subdirs = true;
        } else if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok((files, has_subdirs))
}

fn partition(path: PathBuf, files: Vec<PathBuf>) -> AlbumCandidate {
    let mut supported_audio = Vec::new();
    let mut wav_audio = Vec::new();

    for file in files {
        match audio_family(&file) {
            AudioFamily::Supported => supported_audio.push(file),
            AudioFamily::Wav => wav_audio.push(file),
            AudioFamily::Other => {}
        }
    }

    AlbumCandidate {
        path,
        supported_audio,
        wav_audio,
    }
}
