//! Notifications for scheduled runs.
//!
//! A scheduled run has no terminal to report to, so anything that needs the
//! user's attention goes through a [`Notifier`]: either the system's
//! notification tool or, when notifications are off, the log.

use std::process::Command;

use tracing::{info, warn};

use crate::config::NotificationConfig;

const TITLE: &str = "pileup";

/// Delivers a short message to the user.
pub trait Notifier {
    fn notify(&self, subject: &str, body: &str) -> std::io::Result<()>;
}

/// Runs the configured notification command.
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    command: Vec<String>,
}

impl SystemNotifier {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// The argv with `{title}`, `{subject}` and `{body}` filled in.
    pub fn argv(&self, subject: &str, body: &str) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| {
                arg.replace("{title}", TITLE)
                    .replace("{subject}", subject)
                    .replace("{body}", body)
            })
            .collect()
    }
}

impl Notifier for SystemNotifier {
    fn notify(&self, subject: &str, body: &str) -> std::io::Result<()> {
        let argv = self.argv(subject, body);
        let Some((program, args)) = argv.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "notification command is empty",
            ));
        };

        let status = Command::new(program).args(args).status()?;
        if !status.success() {
            return Err(std::io::Error::other(format!("{program} exited with {status}")));
        }
        Ok(())
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, subject: &str, body: &str) -> std::io::Result<()> {
        info!(subject, body, "Notification");
        Ok(())
    }
}

/// The notifier `config` asks for.
pub fn from_config(config: &NotificationConfig) -> Box<dyn Notifier> {
    if config.system_on {
        Box::new(SystemNotifier::new(config.command.clone()))
    } else {
        Box::new(LogNotifier)
    }
}

/// Notify, logging instead of failing when delivery does not work.
pub fn send(notifier: &dyn Notifier, subject: &str, body: &str) {
    if let Err(e) = notifier.notify(subject, body) {
        warn!(error = %e, subject, "Failed to send notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_substitution() {
        let notifier = SystemNotifier::new(vec![
            "notify-send".to_string(),
            "{title}: {subject}".to_string(),
            "{body}".to_string(),
        ]);

        assert_eq!(
            notifier.argv("ERROR", "config is broken"),
            vec!["notify-send", "pileup: ERROR", "config is broken"]
        );
    }

    #[test]
    fn test_empty_command_fails() {
        let notifier = SystemNotifier::new(Vec::new());
        assert!(notifier.notify("a", "b").is_err());
    }

    #[test]
    fn test_command_exit_status() {
        assert!(SystemNotifier::new(vec!["true".to_string()]).notify("a", "b").is_ok());
        assert!(SystemNotifier::new(vec!["false".to_string()]).notify("a", "b").is_err());
    }

    #[test]
    fn test_from_config_defaults_to_log() {
        let notifier = from_config(&NotificationConfig::default());
        assert!(notifier.notify("subject", "body").is_ok());
    }
}
