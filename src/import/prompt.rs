//! Interactive yes/no and free-text questions.

use dialoguer::{Confirm, Input};
use tracing::warn;

/// Asks the user questions during an import.
///
/// Prompts are serialized on one thread; an implementation never has to
/// deal with concurrent questions.
pub trait Prompter {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for a line of free text, returned trimmed. Empty when no answer
    /// can be read.
    fn ask(&mut self, question: &str) -> String;
}

/// [`Prompter`] asking on the terminal.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        let answer = Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact();
        answer_or_default(answer, question)
    }

    fn ask(&mut self, question: &str) -> String {
        let answer = Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text();
        answer_or_default(answer, question).trim().to_string()
    }
}

/// An unanswerable prompt (no terminal, closed stdin) counts as "no" or "".
fn answer_or_default<T: Default>(answer: dialoguer::Result<T>, question: &str) -> T {
    answer.unwrap_or_else(|e| {
        warn!(error = %e, question, "Failed to read answer");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_stdin() -> dialoguer::Error {
        dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ))
    }

    #[test]
    fn test_failed_confirm_is_no() {
        assert!(!answer_or_default::<bool>(Err(closed_stdin()), "Import?"));
        assert!(answer_or_default(Ok(true), "Import?"));
    }

    #[test]
    fn test_failed_input_is_empty() {
        assert_eq!(answer_or_default::<String>(Err(closed_stdin()), "Which?"), "");
        assert_eq!(answer_or_default(Ok("2".to_string()), "Which?"), "2");
    }
}
