//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, logging setup, signal handling,
//! and the command handlers.

pub mod app;
pub mod args;
pub mod bot_cmd;
pub mod config_cmd;
pub mod domain_cmd;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run, CliError, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{BotAction, Cli, Commands, ConfigAction, DomainAction, SettingsAction};
pub use presenter::Presenter;
