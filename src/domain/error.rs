//! Domain error types

use thiserror::Error;

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Another invocation of the same operation has not finished yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Operation already in progress: {operation}")]
pub struct OperationInProgress {
    pub operation: String,
}

/// Required bot settings are empty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required settings: [{}]. Fill them in before starting the bot", .fields.join(", "))]
pub struct MissingRequiredConfig {
    pub fields: Vec<String>,
}

/// The requested version is the one already running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Version {version} is already in use. Pick a different version")]
pub struct AlreadyUpToDate {
    pub version: String,
}

/// An externally-owned config file does not have the shape we edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized config layout: could not find {anchor}")]
pub struct ProxyConfigUnrecognized {
    pub anchor: String,
}

/// The bot configuration has not been loaded from disk yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Bot configuration is not loaded")]
pub struct ConfigNotLoaded;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_lists_fields() {
        let err = MissingRequiredConfig {
            fields: vec!["Password".to_string(), "Discord Webhook URL".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[Password, Discord Webhook URL]"));
    }

    #[test]
    fn in_progress_names_operation() {
        let err = OperationInProgress {
            operation: "save".to_string(),
        };
        assert_eq!(err.to_string(), "Operation already in progress: save");
    }
}
