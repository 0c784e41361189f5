//! Deciding what happens to one album.
//!
//! Checks run in a fixed order and the first that applies wins: ignored
//! path, history, audio presence, track totals, album title, then fix
//! planning when reformatting is on. Tags are only read once the cheap
//! checks have passed.

use tracing::{debug, warn};

use super::planner::{self, NeedsPrompt};
use super::prompt::Prompter;
use crate::config::ImportConfig;
use crate::history::HistoryStore;
use crate::metadata::TagReader;
use crate::model::{
    AlbumCandidate, AlbumWideTag, CommitPath, ErrorKind, ImportMode, Track, Verdict,
};
use crate::scanner;

/// Classifies albums for one run.
pub struct Classifier<'a, R> {
    reader: &'a R,
    mode: ImportMode,
    policy: ImportConfig,
    ignored: &'a [String],
}

impl<'a, R: TagReader> Classifier<'a, R> {
    /// A classifier for `mode`. Dry runs never prompt.
    pub fn new(reader: &'a R, mode: ImportMode, policy: ImportConfig, ignored: &'a [String]) -> Self {
        let policy = match mode {
            ImportMode::DryRun => ImportConfig {
                allow_prompt: false,
                ..policy
            },
            _ => policy,
        };
        Self {
            reader,
            mode,
            policy,
            ignored,
        }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    /// Reach a verdict for `album`.
    pub fn classify(
        &self,
        album: &AlbumCandidate,
        history: &HistoryStore,
        prompter: &mut dyn Prompter,
    ) -> Verdict {
        let verdict = self.decide(album, history, prompter);
        debug!(target: "import::classify", album = %album.path.display(), verdict = ?verdict, "Classified");
        verdict
    }

    fn decide(
        &self,
        album: &AlbumCandidate,
        history: &HistoryStore,
        prompter: &mut dyn Prompter,
    ) -> Verdict {
        let force = self.mode == ImportMode::Force;

        if scanner::is_ignored(&album.path, self.ignored) {
            return Verdict::Ignored;
        }
        if !force && history.contains(&album.path) {
            return Verdict::AlreadyImported;
        }

        let tracks = self.read_tracks(album);
        if tracks.is_empty() {
            return match (album.wav_audio.is_empty(), force) {
                (true, _) => Verdict::Error(ErrorKind::NoTracks),
                (false, true) => Verdict::Import(CommitPath::Wav),
                (false, false) => Verdict::Error(ErrorKind::WavOnly),
            };
        }

        if !force && let Some(kind) = check_track_total(&tracks) {
            return Verdict::Error(kind);
        }

        let album_title = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.album_title.as_deref()));
        let Some(album_title) = album_title.first() else {
            return Verdict::Error(ErrorKind::MissingAlbumTitle);
        };

        if !self.policy.reformat {
            return Verdict::Import(CommitPath::Audio);
        }

        match planner::plan_fixes(&tracks, album_title, &self.policy, prompter) {
            Ok(plan) => Verdict::ImportWithFixes(plan),
            Err(NeedsPrompt) => Verdict::Error(ErrorKind::SkippedNeedsPrompt),
        }
    }

    /// Read every supported track, dropping the unreadable ones.
    fn read_tracks(&self, album: &AlbumCandidate) -> Vec<Track> {
        album
            .supported_audio
            .iter()
            .filter_map(|path| match self.reader.read(path) {
                Ok(tags) => Some(Track::new(path, tags)),
                Err(e) => {
                    warn!(target: "import::classify", error = %e, "Ignoring unreadable track");
                    None
                }
            })
            .collect()
    }
}

/// Compare the track count against the album-wide track total.
fn check_track_total(tracks: &[Track]) -> Option<ErrorKind> {
    let totals = AlbumWideTag::collect(tracks.iter().map(|t| t.tags.track_total.as_deref()));
    match totals {
        AlbumWideTag::Absent => Some(ErrorKind::MissingTrackTotal),
        AlbumWideTag::Conflicting(_) => Some(ErrorKind::ConflictingTrackTotals),
        AlbumWideTag::Unique(total) => {
            let Ok(total) = total.parse::<usize>() else {
                return Some(ErrorKind::MissingTrackTotal);
            };
            match tracks.len().cmp(&total) {
                std::cmp::Ordering::Less => Some(ErrorKind::MissingTracks),
                std::cmp::Ordering::Greater => Some(ErrorKind::ConflictingTrackTotals),
                std::cmp::Ordering::Equal => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TagSet;
    use crate::test_utils::{FakeTagReader, ScriptedPrompter, album_tags, candidate};
    use std::path::Path;

    fn policy(reformat: bool) -> ImportConfig {
        ImportConfig {
            reformat,
            ..ImportConfig::default()
        }
    }

    fn classify(
        reader: &FakeTagReader,
        album: &AlbumCandidate,
        mode: ImportMode,
        history: &HistoryStore,
    ) -> Verdict {
        Classifier::new(reader, mode, policy(false), &[]).classify(
            album,
            history,
            &mut ScriptedPrompter::new([]),
        )
    }

    #[test]
    fn test_complete_album_imports() {
        let album = candidate("/sync/Album", 3, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "3"));

        let verdict = classify(&reader, &album, ImportMode::Normal, &HistoryStore::in_memory());
        assert_eq!(verdict, Verdict::Import(CommitPath::Audio));
    }

    #[test]
    fn test_already_imported() {
        let album = candidate("/sync/Album", 3, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "3"));
        let mut history = HistoryStore::in_memory();
        history.add(&album.path).unwrap();

        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &history),
            Verdict::AlreadyImported
        );
        assert_eq!(
            classify(&reader, &album, ImportMode::Force, &history),
            Verdict::Import(CommitPath::Audio)
        );
    }

    #[test]
    fn test_no_tracks_and_wav_only() {
        let empty = candidate("/sync/Scans", 0, 0);
        let wav = candidate("/sync/Session", 0, 2);
        let reader = FakeTagReader::default();
        let history = HistoryStore::in_memory();

        assert_eq!(
            classify(&reader, &empty, ImportMode::Force, &history),
            Verdict::Error(ErrorKind::NoTracks)
        );
        assert_eq!(
            classify(&reader, &wav, ImportMode::Normal, &history),
            Verdict::Error(ErrorKind::WavOnly)
        );
        assert_eq!(
            classify(&reader, &wav, ImportMode::Force, &history),
            Verdict::Import(CommitPath::Wav)
        );
    }

    #[test]
    fn test_unreadable_tracks_count_as_absent() {
        let album = candidate("/sync/Album", 2, 0);
        // No tags registered: every read fails
        let reader = FakeTagReader::default();

        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &HistoryStore::in_memory()),
            Verdict::Error(ErrorKind::NoTracks)
        );
    }

    #[test]
    fn test_track_total_checks() {
        let history = HistoryStore::in_memory();

        let album = candidate("/sync/Short", 7, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "10"));
        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &history),
            Verdict::Error(ErrorKind::MissingTracks)
        );
        assert_eq!(
            classify(&reader, &album, ImportMode::Force, &history),
            Verdict::Import(CommitPath::Audio)
        );

        let album = candidate("/sync/Long", 4, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "3"));
        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &history),
            Verdict::Error(ErrorKind::ConflictingTrackTotals)
        );

        let album = candidate("/sync/Untotaled", 2, 0);
        let reader = FakeTagReader::uniform(&album, TagSet {
            album_title: Some("Album".to_string()),
            ..Default::default()
        });
        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &history),
            Verdict::Error(ErrorKind::MissingTrackTotal)
        );
    }

    #[test]
    fn test_conflicting_track_totals() {
        let album = candidate("/sync/Album", 2, 0);
        let mut reader = FakeTagReader::uniform(&album, album_tags("Album", "2020", "2"));
        reader.set(&album.supported_audio[1], album_tags("Album", "2020", "3"));

        assert_eq!(
            classify(&reader, &album, ImportMode::Normal, &HistoryStore::in_memory()),
            Verdict::Error(ErrorKind::ConflictingTrackTotals)
        );
    }

    #[test]
    fn test_missing_album_title_even_when_forced() {
        let album = candidate("/sync/Album", 1, 0);
        let reader = FakeTagReader::uniform(&album, TagSet {
            track_total: Some("1".to_string()),
            ..Default::default()
        });

        assert_eq!(
            classify(&reader, &album, ImportMode::Force, &HistoryStore::in_memory()),
            Verdict::Error(ErrorKind::MissingAlbumTitle)
        );
    }

    #[test]
    fn test_ignored_path() {
        let album = candidate("/sync/Podcasts/Show", 1, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Show", "2020", "1"));
        let ignored = vec!["Podcasts".to_string()];
        let classifier = Classifier::new(&reader, ImportMode::Force, policy(false), &ignored);

        let verdict = classifier.classify(&album, &HistoryStore::in_memory(), &mut ScriptedPrompter::new([]));
        assert_eq!(verdict, Verdict::Ignored);
    }

    #[test]
    fn test_reformat_plans_fixes() {
        let album = candidate("/sync/Album", 2, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album [2020]", "2019", "2"));
        let classifier = Classifier::new(&reader, ImportMode::Normal, policy(true), &[]);

        let mut prompter = ScriptedPrompter::new([true]);
        let verdict = classifier.classify(&album, &HistoryStore::in_memory(), &mut prompter);

        let Verdict::ImportWithFixes(plan) = verdict else {
            panic!("expected fixes, got {verdict:?}");
        };
        assert_eq!(plan.year_override.as_deref(), Some("2020"));
        assert_eq!(plan.album_title, "Album [2020]");
    }

    #[test]
    fn test_dry_run_never_prompts() {
        let album = candidate("/sync/Album", 2, 0);
        let reader = FakeTagReader::uniform(&album, album_tags("Album [2020]", "2019", "2"));
        let classifier = Classifier::new(&reader, ImportMode::DryRun, policy(true), &[]);

        let mut prompter = ScriptedPrompter::new([true]);
        let verdict = classifier.classify(&album, &HistoryStore::in_memory(), &mut prompter);

        assert_eq!(verdict, Verdict::Error(ErrorKind::SkippedNeedsPrompt));
        assert!(prompter.questions.is_empty());
    }

    #[test]
    fn test_check_track_total_non_numeric() {
        let tracks = vec![Track::new(
            Path::new("/a.mp3"),
            TagSet {
                track_total: Some("ten".to_string()),
                ..Default::default()
            },
        )];
        assert_eq!(check_track_total(&tracks), Some(ErrorKind::MissingTrackTotal));
    }
}
