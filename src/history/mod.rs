//! Persistent record of imported albums.
//!
//! The history file is append-only: one record per line, each record the
//! album path's bytes percent-encoded so that any path fits on one line.
//! Every [`HistoryStore::add`] is written and flushed before it returns, so
//! an interrupted run never loses an album that was committed.
//!
//! A file that cannot be read, or whose records do not decode, is treated
//! as empty (logged once) and rewritten from scratch on the next successful
//! add. Only a failed write stops an import run.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// History store errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to write history file {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

/// Set of album identifiers already imported.
#[derive(Debug)]
pub struct HistoryStore {
    /// `None` for a store that is never persisted
    path: Option<PathBuf>,
    records: HashSet<String>,
    writer: Option<BufWriter<File>>,
    needs_rewrite: bool,
}

impl HistoryStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let contents = match fs::read(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Some(Vec::new()),
            Err(e) => {
                tracing::warn!(
                    target: "history",
                    path = %path.display(),
                    error = %e,
                    "History file is unreadable, treating it as empty"
                );
                None
            }
        };

        let (records, needs_rewrite) = match contents.as_deref().map(parse_records) {
            Some(Some(records)) => (records, false),
            Some(None) => {
                tracing::warn!(
                    target: "history",
                    path = %path.display(),
                    "History file is corrupt, treating it as empty"
                );
                (HashSet::new(), true)
            }
            None => (HashSet::new(), true),
        };

        tracing::debug!(target: "history", path = %path.display(), count = records.len(), "Loaded import history");

        Self {
            path: Some(path),
            records,
            writer: None,
            needs_rewrite,
        }
    }

    /// A store that lives only in memory (dry runs).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: HashSet::new(),
            writer: None,
            needs_rewrite: false,
        }
    }

    /// Whether `album` has been imported before.
    pub fn contains(&self, album: &Path) -> bool {
        self.records.contains(&record_for(album))
    }

    /// Record `album` as imported. Returns `false` if it already was.
    pub fn add(&mut self, album: &Path) -> Result<bool, HistoryError> {
        let record = record_for(album);
        if self.records.contains(&record) {
            return Ok(false);
        }

        if let Some(path) = self.path.clone() {
            if self.needs_rewrite {
                self.rewrite(&path, &record)?;
            } else {
                let writer = self.writer(&path)?;
                writeln!(writer, "{record}")
                    .and_then(|_| writer.flush())
                    .map_err(|e| HistoryError::Write(path.clone(), e))?;
            }
        }

        tracing::debug!(target: "history", album = %album.display(), "Recorded import");
        self.records.insert(record);
        Ok(true)
    }

    /// Flush any buffered records to disk.
    pub fn flush(&mut self) -> Result<(), HistoryError> {
        if let (Some(writer), Some(path)) = (self.writer.as_mut(), self.path.as_ref()) {
            writer
                .flush()
                .map_err(|e| HistoryError::Write(path.clone(), e))?;
        }
        Ok(())
    }

    /// Imported album paths, sorted.
    pub fn albums(&self) -> Vec<String> {
        let mut albums: Vec<String> = self
            .records
            .iter()
            .map(|record| {
                String::from_utf8_lossy(&urlencoding::decode_binary(record.as_bytes()))
                    .into_owned()
            })
            .collect();
        albums.sort_unstable();
        albums
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn writer(&mut self, path: &Path) -> Result<&mut BufWriter<File>, HistoryError> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                ensure_parent(path)?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| HistoryError::Write(path.to_path_buf(), e))?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }

    fn rewrite(&mut self, path: &Path, new_record: &str) -> Result<(), HistoryError> {
        ensure_parent(path)?;
        let mut contents: Vec<&str> = self.records.iter().map(String::as_str).collect();
        contents.push(new_record);
        contents.sort_unstable();

        let mut text = contents.join("\n");
        text.push('\n');
        fs::write(path, text).map_err(|e| HistoryError::Write(path.to_path_buf(), e))?;

        self.writer = None;
        self.needs_rewrite = false;
        tracing::info!(target: "history", path = %path.display(), "Rewrote corrupt history file");
        Ok(())
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!(target: "history", error = %e, "Failed to flush import history");
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), HistoryError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| HistoryError::Write(path.to_path_buf(), e))?;
    }
    Ok(())
}

/// Encode an album path as a single-line record.
fn record_for(album: &Path) -> String {
    urlencoding::encode_binary(album.as_os_str().as_encoded_bytes()).into_owned()
}

/// Parse the file contents, or `None` if any record is not a valid encoding.
fn parse_records(contents: &[u8]) -> Option<HashSet<String>> {
    let text = std::str::from_utf8(contents).ok()?;
    let mut records = HashSet::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let decoded = urlencoding::decode_binary(line.as_bytes());
        if urlencoding::encode_binary(&decoded) != line {
            return None;
        }
        records.insert(line.to_string());
    }

    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("history"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("history");
        let album = Path::new("/sync/Artist - Album");

        {
            let mut store = HistoryStore::open(&path);
            assert!(store.add(album).unwrap());
            assert!(store.contains(album));
        }

        let store = HistoryStore::open(&path);
        assert!(store.contains(album));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let album = Path::new("/sync/Album");

        let mut store = HistoryStore::open(&path);
        assert!(store.add(album).unwrap());
        assert!(!store.add(album).unwrap());
        drop(store);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_add_appends_without_rewriting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "%2Fold%2Falbum\n").unwrap();

        let mut store = HistoryStore::open(&path);
        store.add(Path::new("/new/album")).unwrap();
        drop(store);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "%2Fold%2Falbum\n%2Fnew%2Falbum\n");
    }

    #[test]
    fn test_paths_with_newlines_and_quotes_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let album = Path::new("/sync/It's \"Odd\"\nName $1");

        HistoryStore::open(&path).add(album).unwrap();

        let store = HistoryStore::open(&path);
        assert!(store.contains(album));
        assert_eq!(store.albums(), vec![album.display().to_string()]);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty_and_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "this is not/an encoded record\n").unwrap();

        let mut store = HistoryStore::open(&path);
        assert!(store.is_empty());

        store.add(Path::new("/sync/Album")).unwrap();
        drop(store);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "%2Fsync%2FAlbum\n");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();

        let store = HistoryStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_empty_and_write_fails_later() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        fs::create_dir(&path).unwrap();

        let mut store = HistoryStore::open(&path);
        assert!(store.is_empty());
        assert!(!store.contains(Path::new("/sync/Album")));

        let err = store.add(Path::new("/sync/Album")).unwrap_err();
        assert!(matches!(err, HistoryError::Write(..)));
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = HistoryStore::in_memory();
        store.add(Path::new("/a")).unwrap();
        assert!(store.contains(Path::new("/a")));
        assert!(!store.contains(Path::new("/b")));
    }

    #[test]
    fn test_albums_sorted() {
        let mut store = HistoryStore::in_memory();
        store.add(Path::new("/b")).unwrap();
        store.add(Path::new("/a")).unwrap();
        assert_eq!(store.albums(), vec!["/a".to_string(), "/b".to_string()]);
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Anything added is contained afterwards
        #[test]
        fn add_then_contains(paths in prop::collection::vec("[a-zA-Z0-9 '\"$/\\n_.-]{1,40}", 1..10)) {
            let mut store = HistoryStore::in_memory();
            for p in &paths {
                store.add(Path::new(p)).unwrap();
                prop_assert!(store.contains(Path::new(p)));
            }
            for p in &paths {
                prop_assert!(store.contains(Path::new(p)));
            }
        }

        /// Every encoded record is a single valid line
        #[test]
        fn records_parse_back(p in "[ -~\\n]{1,60}") {
            let record = record_for(Path::new(&p));
            prop_assert!(!record.contains('\n'));
            let parsed = parse_records(format!("{record}\n").as_bytes());
            prop_assert!(parsed.is_some_and(|r| r.contains(&record)));
        }
    }
}
