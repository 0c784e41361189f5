//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\pileup\config.toml
//! - macOS: ~/Library/Application Support/pileup/config.toml
//! - Linux: ~/.config/pileup/config.toml
//!
//! The config file is human-readable and editable. It is read once per
//! invocation and passed down explicitly; nothing reads it at module load.
//! Paths may start with `~`, which expands to the user's home directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pileup";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roots that are searched for new albums (typically synced folders)
    pub shared_directories: BTreeSet<PathBuf>,

    /// Album paths containing any of these substrings are never imported
    pub ignored_directories: BTreeSet<String>,

    /// Destination of the directory library backend
    pub local_directory: PathBuf,

    /// Record of every album imported so far
    #[serde(alias = "pickle_file")]
    pub history_file: PathBuf,

    /// Application that WAV-only albums are opened in
    pub music_player: String,

    /// Import policy flags
    pub import: ImportConfig,

    /// Library backend settings
    pub library: LibraryConfig,

    /// Scheduled-run notifications
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared_directories: BTreeSet::from([home_path("Dropbox")]),
            ignored_directories: BTreeSet::new(),
            local_directory: home_path("Music"),
            history_file: default_history_file(),
            music_player: "Swinsian".to_string(),
            import: ImportConfig::default(),
            library: LibraryConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Policy flags for metadata repair during import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Plan metadata fixes (bracket years, discs, solo instruments)
    pub reformat: bool,

    /// Ask before applying the default disc 1 of 1
    pub ask_before_disc_update: bool,

    /// Ask before moving a bracketed solo instrument into the comments
    pub ask_before_artist_update: bool,

    /// Whether interactive prompts may be shown at all
    pub allow_prompt: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            reformat: false,
            ask_before_disc_update: false,
            ask_before_artist_update: true,
            allow_prompt: true,
        }
    }
}

/// Which library the albums are committed into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryBackend {
    /// Hand albums to the `beet` command line tool
    #[default]
    Beets,
    /// Copy albums into `local_directory` and edit tags in place
    Directory,
}

/// Library backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub backend: LibraryBackend,

    /// Executable used for `import` and `modify` (beets backend only)
    pub beet_command: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            backend: LibraryBackend::Beets,
            beet_command: "beet".to_string(),
        }
    }
}

/// Notification settings for scheduled runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send a system notification when a scheduled run needs attention
    pub system_on: bool,

    /// Notifier argv; `{title}`, `{subject}` and `{body}` are substituted
    pub command: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        let command: &[&str] = if cfg!(target_os = "macos") {
            &[
                "terminal-notifier",
                "-title",
                "{title}",
                "-subtitle",
                "{subject}",
                "-message",
                "{body}",
            ]
        } else {
            &["notify-send", "{title}: {subject}", "{body}"]
        };

        Self {
            system_on: false,
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Expand `~` in every configured path.
    pub fn expand_paths(mut self) -> Self {
        self.shared_directories = self
            .shared_directories
            .iter()
            .map(|p| expand_tilde(p))
            .collect();
        self.local_directory = expand_tilde(&self.local_directory);
        self.history_file = expand_tilde(&self.history_file);
        self
    }

    /// Check the values an import run cannot do without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_directories.is_empty() {
            return Err(ConfigError::NoSharedDirectories);
        }
        if self.music_player.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "music_player must not be empty".to_string(),
            ));
        }
        if self.library.beet_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "library.beet_command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Directory holding the history file and scheduled-run logs
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_NAME))
}

/// Log file written by scheduled runs
pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join(format!("{APP_NAME}.log")))
}

fn default_history_file() -> PathBuf {
    data_dir()
        .map(|d| d.join("imported_albums"))
        .unwrap_or_else(|| PathBuf::from("imported_albums"))
}

fn home_path(name: &str) -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Replace a leading `~` with the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Load configuration from disk.
///
/// `path` overrides the default location. A missing file yields the
/// defaults; a file that exists but cannot be read or parsed is an error,
/// since importing with half a config could touch the wrong directories.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(path) => expand_tilde(path),
        None => config_path().ok_or(ConfigError::NoConfigDir)?,
    };

    if !path.exists() {
        tracing::info!(target: "config", path = %path.display(), "No config file found, using defaults");
        let config = Config::default().expand_paths();
        config.validate()?;
        return Ok(config);
    }

    let contents =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::Read(path.clone(), e))?;
    let config = parse(&contents).map_err(|e| match e {
        ConfigError::Parse(_, source) => ConfigError::Parse(path.clone(), source),
        other => other,
    })?;

    tracing::info!(target: "config", path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse and validate config file contents.
pub fn parse(contents: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
    let config = config.expand_paths();
    config.validate()?;
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("No shared directories configured")]
    NoSharedDirectories,

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Tests
// ============================================================================
