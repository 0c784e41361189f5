//! Bracketed annotations recognized in album titles and artist names.
//!
//! Compiled once on first use.

use regex::Regex;
use std::sync::LazyLock;

/// `Album [2020]`, `Album [2020 EP]`, `Album [2020 single]`
pub static BRACKET_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\[([0-9]{4})(?:\s(?:.*EP|.*single))?\]").expect("bracket year regex is valid")
});

/// `Album [Disc 2]`, `Album [disc2 of 3]`
pub static BRACKET_DISC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\[([Dd]isc\s?[0-9]+.*?)\]").expect("bracket disc regex is valid")
});

/// `Album [1962-1965]`, `Album [1998/99]`
pub static YEAR_RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\[([0-9]{4}\s?[-/]\s?[0-9]{2,4})\]").expect("year range regex is valid")
});

/// `Artist [solo piano]`
pub static SOLO_INSTRUMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\[solo.+\]").expect("solo instrument regex is valid"));

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("number regex is valid"));

/// The 4-digit year in an album title's bracket, if any.
pub fn bracket_year(album_title: &str) -> Option<&str> {
    BRACKET_YEAR_REGEX
        .captures(album_title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The disc number in an album title's bracket, if any (`[Disc 2 of 3]` is `2`).
pub fn bracket_disc(album_title: &str) -> Option<&str> {
    let inner = BRACKET_DISC_REGEX.captures(album_title)?.get(1)?;
    NUMBER_REGEX.find(inner.as_str()).map(|m| m.as_str())
}

/// The year range in an album title's bracket, without spaces.
pub fn bracket_year_range(album_title: &str) -> Option<String> {
    YEAR_RANGE_REGEX
        .captures(album_title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
}

/// The bracketed solo instrument annotation of an artist, trimmed.
pub fn solo_instrument(artist: &str) -> Option<&str> {
    SOLO_INSTRUMENT_REGEX
        .find(artist)
        .map(|m| m.as_str().trim())
}

pub fn strip_solo_instrument(artist: &str) -> String {
    SOLO_INSTRUMENT_REGEX.replace_all(artist, "").into_owned()
}

pub fn strip_bracket_year(album_title: &str) -> String {
    BRACKET_YEAR_REGEX.replace_all(album_title, "").into_owned()
}

pub fn strip_bracket_disc(album_title: &str) -> String {
    BRACKET_DISC_REGEX.replace_all(album_title, "").into_owned()
}
