//! Command-line interface for pileup.
//!
//! Commands load the configuration themselves, so that `logs` works even
//! when the config file is broken.

mod commands;

pub use commands::{Cli, Commands, ImportArgs, OutputFormat, run_command};
