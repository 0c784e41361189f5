//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `import`: import new albums from the shared directories
//! - `imported`: list albums already imported
//! - `logs`: show the scheduled-run log

mod import;
mod imported;
mod logs;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use import::cmd_import;
pub use imported::cmd_imported;
pub use logs::cmd_logs;

/// Import newly added albums from shared folders into a music library
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PILEUP_CONFIG", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether this invocation is an unattended scheduled import.
    pub fn is_scheduled_run(&self) -> bool {
        matches!(&self.command, Commands::Import(args) if args.is_scheduled_run)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import newly added albums
    Import(ImportArgs),
    /// List albums that have been imported
    Imported,
    /// Show the log of scheduled imports
    Logs {
        /// Only show lines recording an import
        #[arg(long)]
        imported: bool,
    },
}

/// Output format of the import report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments of `pileup import`
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Album directories to import (in Force mode) instead of searching the
    /// shared directories
    #[arg(value_name = "ALBUM")]
    pub albums: Vec<PathBuf>,

    /// Plan metadata fixes for imported albums
    #[arg(long, overrides_with = "no_reformat")]
    pub reformat: bool,
    /// Import albums without fixing metadata
    #[arg(long, overrides_with = "reformat")]
    pub no_reformat: bool,

    /// Ask before applying default disc numbers
    #[arg(long, overrides_with = "auto_update_disc")]
    pub ask_before_disc_update: bool,
    /// Apply default disc numbers without asking
    #[arg(long, overrides_with = "ask_before_disc_update")]
    pub auto_update_disc: bool,

    /// Ask before removing solo instruments from artist names
    #[arg(long, overrides_with = "auto_update_artist")]
    pub ask_before_artist_update: bool,
    /// Remove solo instruments from artist names without asking
    #[arg(long, overrides_with = "ask_before_artist_update")]
    pub auto_update_artist: bool,

    /// Allow interactive prompts
    #[arg(long, overrides_with = "disallow_prompt")]
    pub allow_prompt: bool,
    /// Skip albums that would need a prompt
    #[arg(long, overrides_with = "allow_prompt")]
    pub disallow_prompt: bool,

    /// Ignore import history and import albums with importable errors
    #[arg(short, long, conflicts_with = "dry_run")]
    pub force: bool,

    /// Show what would be imported without importing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run unattended: no prompts, errors are sent as notifications
    #[arg(long)]
    pub is_scheduled_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Resolve a `--flag` / `--no-flag` pair. `None` when neither was given.
pub(crate) fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Run the parsed command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config_file = cli.config_file.as_deref();
    match &cli.command {
        Commands::Import(args) => cmd_import(config_file, args),
        Commands::Imported => cmd_imported(config_file),
        Commands::Logs { imported } => cmd_logs(*imported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pileup").chain(args.iter().copied())).unwrap()
    }

    fn import_args(args: &[&str]) -> ImportArgs {
        match parse(args).command {
            Commands::Import(args) => args,
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_paired_flags_last_wins() {
        let args = import_args(&["import", "--reformat", "--no-reformat"]);
        assert_eq!(flag_pair(args.reformat, args.no_reformat), Some(false));

        let args = import_args(&["import", "--disallow-prompt", "--allow-prompt"]);
        assert_eq!(flag_pair(args.allow_prompt, args.disallow_prompt), Some(true));

        let args = import_args(&["import"]);
        assert_eq!(flag_pair(args.ask_before_disc_update, args.auto_update_disc), None);
    }

    #[test]
    fn test_force_conflicts_with_dry_run() {
        let result = Cli::try_parse_from(["pileup", "import", "--force", "--dry-run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_albums_and_format() {
        let args = import_args(&["import", "--format", "json", "/a", "/b"]);
        assert_eq!(args.albums, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_scheduled_run_detection() {
        assert!(parse(&["import", "--is-scheduled-run"]).is_scheduled_run());
        assert!(!parse(&["imported"]).is_scheduled_run());
    }

    #[test]
    fn test_global_config_file() {
        let cli = parse(&["logs", "--config-file", "/tmp/pileup.toml"]);
        assert_eq!(cli.config_file, Some(PathBuf::from("/tmp/pileup.toml")));
    }
}
