//! Operation state machine shared by every orchestrator
//!
//! State machine:
//!   IDLE | SUCCESS | ERROR -> IN_PROGRESS (begin)
//!   IN_PROGRESS -> SUCCESS (succeed)
//!   IN_PROGRESS -> ERROR (fail)
//!   SUCCESS -> IDLE (reset, scheduled after a delay)

use std::fmt;

/// Operation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationState {
    #[default]
    Idle,
    InProgress,
    Success,
    Error,
}

impl OperationState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in-progress",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kinds of operation the panel runs, each with its own state slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Save,
    Start,
    Update,
    VersionList,
    DnsCheck,
    DomainConnect,
}

impl OperationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Start => "start",
            Self::Update => "update",
            Self::VersionList => "version list",
            Self::DnsCheck => "dns check",
            Self::DomainConnect => "domain connection",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State plus the message shown next to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    pub state: OperationState,
    pub message: String,
}

impl OperationStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, message: impl Into<String>) {
        self.state = OperationState::InProgress;
        self.message = message.into();
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.state = OperationState::Success;
        self.message = message.into();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = OperationState::Error;
        self.message = message.into();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// How a best-effort step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and its effect is in place
    Applied,
    /// The step was not needed
    Skipped,
    /// The step failed or found nothing to act on; the enclosing operation still succeeds
    Degraded(String),
}

impl StepOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_is_idle() {
        let status = OperationStatus::new();
        assert_eq!(status.state, OperationState::Idle);
        assert!(status.message.is_empty());
    }

    #[test]
    fn full_cycle() {
        let mut status = OperationStatus::new();
        status.begin("Saving...");
        assert_eq!(status.state, OperationState::InProgress);

        status.succeed("Saved");
        assert!(status.state.is_terminal());
        assert_eq!(status.message, "Saved");

        status.reset();
        assert_eq!(status, OperationStatus::new());
    }

    #[test]
    fn error_keeps_message() {
        let mut status = OperationStatus::new();
        status.begin("Saving...");
        status.fail("disk full");
        assert_eq!(status.state, OperationState::Error);
        assert_eq!(status.message, "disk full");
    }

    #[test]
    fn state_display() {
        assert_eq!(OperationState::Idle.to_string(), "idle");
        assert_eq!(OperationState::InProgress.to_string(), "in-progress");
        assert_eq!(OperationKind::DomainConnect.to_string(), "domain connection");
    }

    #[test]
    fn degraded_outcome() {
        assert!(StepOutcome::Degraded("no file".to_string()).is_degraded());
        assert!(!StepOutcome::Applied.is_degraded());
        assert!(!StepOutcome::Skipped.is_degraded());
    }
}
