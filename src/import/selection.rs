//! Choosing which failed albums to import anyway.
//!
//! An answer may mix 1-based indices into the importable error table and
//! error labels (`missing tracks`, `wav files`, ...). `all` selects every
//! album; an empty answer or `n` selects none.

use std::path::{Path, PathBuf};

use crate::model::ErrorKind;

/// Albums selected by `answer`, in table order and without duplicates.
pub fn parse_selection(answer: &str, table: &[(usize, &Path, ErrorKind)]) -> Vec<PathBuf> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() || answer == "n" || answer == "no" {
        return Vec::new();
    }
    if answer == "all" {
        return table.iter().map(|(_, album, _)| album.to_path_buf()).collect();
    }

    let kinds: Vec<ErrorKind> = ErrorKind::ALL
        .into_iter()
        .filter(|kind| kind.is_importable() && answer.contains(kind.label()))
        .collect();

    let indices: Vec<usize> = answer
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|n| n.parse().ok())
        .collect();

    table
        .iter()
        .filter(|(index, _, kind)| indices.contains(index) || kinds.contains(kind))
        .map(|(_, album, _)| album.to_path_buf())
        .collect()
}
