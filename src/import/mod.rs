//! Importing new albums from shared directories.
//!
//! [`Importer`] runs the pipeline for a list of album candidates:
//! [`Classifier`] decides each album's [`Verdict`](crate::model::Verdict),
//! [`planner`] works out metadata repairs, and the library writer commits.
//! The outcome is an [`ImportReport`].

mod classifier;
mod orchestrator;
pub mod patterns;
pub mod planner;
pub mod prompt;
mod report;
pub mod selection;

pub use classifier::Classifier;
pub use orchestrator::Importer;
pub use prompt::{Prompter, StdinPrompter};
pub use report::{ImportReport, PlannedImport, display_album, error_album_message};
