//! Metadata fix planning.
//!
//! Looks at the tags of an album that is about to be imported and decides
//! which repairs to make once it is in the library:
//!
//! - a bracketed year in the album title that disagrees with the year tag
//! - a bracketed disc number in the album title, or missing disc tags
//! - a bracketed solo instrument in an artist name, moved to the comments
//! - a bracketed year range, noted in the comments of undated tracks
//!
//! Every question is asked here, before the commit. When a question would be
//! needed but prompting is disabled, planning fails with [`NeedsPrompt`] and
//! the album is skipped. Given the same tags and the same answers the plan is
//! always the same.

use tracing::debug;

use super::patterns;
use super::prompt::Prompter;
use crate::config::ImportConfig;
use crate::metadata::TagField;
use crate::model::{AlbumWideTag, ArtistTerm, FixPlan, Track, TrackComment};

/// Planning needs an answer from the user, but prompting is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("album needs a prompt, but prompting is disabled")]
pub struct NeedsPrompt;

/// Plan the fixes for an album titled `album_title`.
pub fn plan_fixes(
    tracks: &[Track],
    album_title: &str,
    policy: &ImportConfig,
    prompter: &mut dyn Prompter,
) -> Result<FixPlan, NeedsPrompt> {
    let mut plan = FixPlan::empty(album_title, artist_term(tracks));

    let year = plan_year(tracks, album_title, policy, prompter)?;
    let year_range = match year {
        Some(_) => None,
        None => year_range_comment(tracks, album_title),
    };
    if let Some(year) = year {
        plan.year_override = Some(year);
        plan.strip_bracket_year_from_album_title = true;
    }

    let disc = plan_disc(tracks, album_title, policy, prompter)?;
    plan.disc_number_override = disc.number;
    plan.disc_total_override = disc.total;
    plan.strip_bracket_disc_from_album_title = disc.strip_bracket;

    plan.artists_to_strip = plan_artist_strip(tracks, policy, prompter)?;
    plan.track_comments = track_comments(tracks, year_range.as_deref(), &plan.artists_to_strip);

    debug!(target: "import::plan", album = album_title, empty = plan.is_empty(), "Planned fixes");
    Ok(plan)
}

/// The artist term every album-level query starts with.
///
/// The album artist if any track has one, otherwise the artist when all
/// tracks agree on it. Compilations without an album artist get no term.
pub fn artist_term(tracks: &[Track]) -> Option<ArtistTerm> {
    let album_artist = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.album_artist.as_deref()));
    if let Some(value) = album_artist.first() {
        return Some(ArtistTerm {
            field: TagField::AlbumArtist,
            value: value.clone(),
        });
    }

    match AlbumWideTag::collect(tracks.iter().map(|t| t.tags.artist.as_deref())) {
        AlbumWideTag::Unique(value) => Some(ArtistTerm {
            field: TagField::Artist,
            value,
        }),
        // All present values agree, some tracks lack the tag
        AlbumWideTag::Conflicting(values) if values.len() == 1 => Some(ArtistTerm {
            field: TagField::Artist,
            value: values.into_iter().next()?,
        }),
        _ => None,
    }
}

fn plan_year(
    tracks: &[Track],
    album_title: &str,
    policy: &ImportConfig,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>, NeedsPrompt> {
    let years = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.year.as_deref()));
    let Some(year) = years.unique() else {
        return Ok(None);
    };
    let Some(bracket_year) = patterns::bracket_year(album_title) else {
        return Ok(None);
    };
    if bracket_year == year {
        return Ok(None);
    }
    if !policy.allow_prompt {
        return Err(NeedsPrompt);
    }

    let question = format!(
        "Use bracket year {bracket_year} instead of year ({year}) for album: {album_title}?"
    );
    Ok(prompter
        .confirm(&question)
        .then(|| bracket_year.to_string()))
}

/// Year range to note in the comments, when the tags cannot carry it.
fn year_range_comment(tracks: &[Track], album_title: &str) -> Option<String> {
    let range = patterns::bracket_year_range(album_title)?;
    let start_year = range.get(..4)?;

    let mut years = tracks.iter().map(|t| t.tags.year.as_deref());
    let start_is_tagged = years.clone().any(|y| y == Some(start_year));
    let all_dated = years.all(|y| y.is_some());

    (!start_is_tagged && !all_dated).then_some(range)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DiscFix {
    number: Option<String>,
    total: Option<String>,
    strip_bracket: bool,
}

fn plan_disc(
    tracks: &[Track],
    album_title: &str,
    policy: &ImportConfig,
    prompter: &mut dyn Prompter,
) -> Result<DiscFix, NeedsPrompt> {
    let disc_number = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.disc_number.as_deref()));
    let disc_number = disc_number.first().map(String::as_str);

    let Some(bracket_disc) = patterns::bracket_disc(album_title) else {
        if disc_number.is_some() {
            return Ok(DiscFix::default());
        }
        let disc_total = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.disc_total.as_deref()));
        if !disc_total.is_absent() {
            return Ok(DiscFix::default());
        }
        if policy.ask_before_disc_update && !policy.allow_prompt {
            return Err(NeedsPrompt);
        }

        let apply = !policy.ask_before_disc_update
            || prompter.confirm(&format!(
                "Apply default disc and disc total value of 1 to album with missing disc and disc total: {album_title}?"
            ));
        return Ok(if apply {
            DiscFix {
                number: Some("1".to_string()),
                total: Some("1".to_string()),
                strip_bracket: false,
            }
        } else {
            DiscFix::default()
        });
    };

    if disc_number == Some(bracket_disc) {
        return Ok(DiscFix {
            strip_bracket: true,
            ..DiscFix::default()
        });
    }
    if !policy.allow_prompt {
        return Err(NeedsPrompt);
    }

    let question = format!(
        "Use bracket disc {bracket_disc} instead of disc ({}) for album: {album_title}?",
        disc_number.unwrap_or_default()
    );
    Ok(if prompter.confirm(&question) {
        DiscFix {
            number: Some(bracket_disc.to_string()),
            total: None,
            strip_bracket: true,
        }
    } else {
        DiscFix::default()
    })
}

fn plan_artist_strip(
    tracks: &[Track],
    policy: &ImportConfig,
    prompter: &mut dyn Prompter,
) -> Result<Vec<String>, NeedsPrompt> {
    let mut candidates: Vec<&str> = Vec::new();
    for artist in tracks.iter().filter_map(|t| t.tags.artist.as_deref()) {
        if patterns::solo_instrument(artist).is_some() && !candidates.contains(&artist) {
            candidates.push(artist);
        }
    }

    let mut artists = Vec::new();
    for artist in candidates {
        if policy.ask_before_artist_update && !policy.allow_prompt {
            return Err(NeedsPrompt);
        }
        let apply = !policy.ask_before_artist_update
            || prompter.confirm(&format!(
                "Remove bracketed solo instrument indication {artist} from the artist field and add to comments?"
            ));
        if apply {
            artists.push(artist.to_string());
        }
    }
    Ok(artists)
}

/// New comments for every track that gains a note.
fn track_comments(
    tracks: &[Track],
    year_range: Option<&str>,
    artists_to_strip: &[String],
) -> Vec<TrackComment> {
    tracks
        .iter()
        .filter_map(|track| {
            let artist = track.tags.artist.as_deref();
            let instrument = artist
                .filter(|a| artists_to_strip.iter().any(|s| s == a))
                .and_then(patterns::solo_instrument);

            let mut comments = track.tags.comments.clone();
            for note in [year_range, instrument].into_iter().flatten() {
                comments = Some(append_comment(comments.as_deref(), note));
            }

            let comments = comments.filter(|c| Some(c.as_str()) != track.tags.comments.as_deref())?;
            Some(TrackComment {
                title: track.tags.title.clone(),
                artist: artist.map(str::to_string),
                comments,
            })
        })
        .collect()
}

/// Append `note` to an existing comment, separated by `"; "`.
pub fn append_comment(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}; {note}"),
        _ => note.to_string(),
    }
}
