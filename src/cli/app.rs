//! Main app runner: settings, panel wiring and command dispatch

use std::env;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::ports::{FileError, SettingsStore};
use crate::application::{
    DomainLinkError, LifecycleError, OperationSlot, Panel, PanelPorts, SaveError, TriggerError,
};
use crate::domain::config::PanelSettings;
use crate::domain::error::{ConfigError, ConfigNotLoaded, OperationInProgress};
use crate::infrastructure::{
    DockerHubRegistry, GithubReleases, LocalFs, ProcessRunner, TomlSettingsStore,
};

use super::args::{Cli, Commands};
use super::bot_cmd::handle_bot_command;
use super::config_cmd::{handle_config_command, handle_save, handle_settings_command};
use super::domain_cmd::{handle_domain_command, handle_trigger};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the bot env file location
pub const ENV_FILE_ENV: &str = "POABOT_PANEL_ENV_FILE";

/// Everything a command can fail with
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    NotLoaded(#[from] ConfigNotLoaded),

    #[error(transparent)]
    Busy(#[from] OperationInProgress),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    DomainLink(#[from] DomainLinkError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("{0}")]
    InvalidWhitelist(String),

    #[error("{0} does not resolve to this server")]
    DnsInvalid(String),

    #[error("Unable to determine this server's address")]
    NoServerAddress,

    #[error("{0}")]
    Usage(String),

    #[error("Failed to setup signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_)
            | Self::InvalidWhitelist(_)
            | Self::Config(ConfigError::ValidationError { .. })
            | Self::Save(SaveError::InvalidWhitelist { .. }) => EXIT_USAGE_ERROR,
            _ => EXIT_ERROR,
        }
    }
}

/// Run a parsed command line to completion
pub async fn run(cli: Cli) -> ExitCode {
    let mut presenter = Presenter::new();

    match dispatch(cli, &mut presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.stop_spinner();
            presenter.error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn dispatch(cli: Cli, presenter: &mut Presenter) -> Result<(), CliError> {
    let store = settings_store(cli.settings);

    match cli.command {
        Commands::Settings { action } => handle_settings_command(action, &store, presenter).await,
        Commands::Config { action } => {
            let panel = open_panel(&store).await?;
            handle_config_command(action, &panel, presenter).await
        }
        Commands::Save { whitelist } => {
            let panel = open_panel(&store).await?;
            handle_save(&panel, whitelist, presenter).await
        }
        Commands::Bot { action } => {
            let panel = open_panel(&store).await?;
            handle_bot_command(action, &panel, presenter).await
        }
        Commands::Domain { action } => {
            let panel = open_panel(&store).await?;
            handle_domain_command(action, &panel, presenter).await
        }
        Commands::Trigger(args) => {
            let panel = open_panel(&store).await?;
            handle_trigger(args, &panel, presenter).await
        }
    }
}

/// Settings store at `path`, or the default location
pub fn settings_store(path: Option<PathBuf>) -> TomlSettingsStore {
    match path {
        Some(path) => TomlSettingsStore::with_path(path),
        None => TomlSettingsStore::new(),
    }
}

/// Load and merge settings: defaults < file < env
pub async fn load_settings<S: SettingsStore>(store: &S) -> Result<PanelSettings, ConfigError> {
    let file_settings = store.load().await?;

    let env_settings = PanelSettings {
        env_file: env::var(ENV_FILE_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from),
        ..Default::default()
    };

    Ok(PanelSettings::defaults()
        .merge(file_settings)
        .merge(env_settings))
}

/// Wire the panel against the real host, registry and release source
pub fn build_panel(settings: &PanelSettings) -> Panel {
    Panel::new(
        settings,
        PanelPorts {
            runner: Arc::new(ProcessRunner::default()),
            fs: Arc::new(LocalFs::new()),
            registry: Arc::new(DockerHubRegistry::new(settings.registry_url_or_default())),
            releases: Arc::new(GithubReleases::new(
                settings.tooling_releases_url_or_default(),
            )),
        },
    )
}

async fn open_panel<S: SettingsStore>(store: &S) -> Result<Panel, CliError> {
    let settings = load_settings(store).await?;
    debug!(path = %store.path().display(), "Settings loaded");
    Ok(build_panel(&settings))
}

/// Run an operation behind a spinner, finishing it with the slot's final status.
///
/// On error the spinner is cleared and the caller reports the error.
pub(crate) async fn with_spinner<T, E, F>(
    presenter: &mut Presenter,
    slot: &OperationSlot,
    message: &str,
    operation: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    presenter.start_spinner(message);
    let result = operation.await;
    match &result {
        Ok(_) => presenter.finish_operation(&slot.status()),
        Err(_) => presenter.stop_spinner(),
    }
    result
}
