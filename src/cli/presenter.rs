//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::{BotState, BotStatus};
use crate::domain::{OperationState, OperationStatus, StepOutcome};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (values meant for scripts)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config show)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print a bot status line
    pub fn bot_status(&self, status: &BotStatus) {
        let dot = match status.state {
            BotState::Running => "●".green(),
            BotState::Stopped => "●".red(),
            BotState::Unknown => "●".yellow(),
        };
        eprintln!("{} {}", dot, format_bot_status(status));
    }

    /// Print the outcome of a best-effort step
    pub fn step(&self, label: &str, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Applied => self.success(label),
            StepOutcome::Skipped => self.info(&format!("{label}: nothing to do")),
            StepOutcome::Degraded(reason) => self.warn(&format!("{label}: {reason}")),
        }
    }

    /// Finish the spinner according to an operation slot's final status
    pub fn finish_operation(&mut self, status: &OperationStatus) {
        match status.state {
            OperationState::Success => self.spinner_success(&status.message),
            OperationState::Error => self.spinner_fail(&status.message),
            OperationState::Idle | OperationState::InProgress => self.stop_spinner(),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_bot_status(status: &BotStatus) -> String {
    match &status.version {
        Some(version) => format!("{} (v{})", status.message, version),
        None => status.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_includes_version() {
        let status = BotStatus {
            state: BotState::Running,
            message: "PoaBot is running: Up 2 hours".to_string(),
            version: Some("1.4.2".to_string()),
        };
        assert_eq!(
            format_bot_status(&status),
            "PoaBot is running: Up 2 hours (v1.4.2)"
        );
    }

    #[test]
    fn status_line_without_version() {
        let status = BotStatus {
            state: BotState::Stopped,
            message: "PoaBot is not running".to_string(),
            version: None,
        };
        assert_eq!(format_bot_status(&status), "PoaBot is not running");
    }

    #[test]
    fn finishing_without_spinner_is_harmless() {
        let mut presenter = Presenter::new();
        presenter.finish_operation(&OperationStatus::default());
        presenter.spinner_success("done");
    }
}
