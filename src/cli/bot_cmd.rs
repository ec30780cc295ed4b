//! Bot container command handlers

use std::time::Duration;

use crate::application::{Panel, VersionListing};

use super::app::{with_spinner, CliError};
use super::args::BotAction;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Handle bot subcommand
pub async fn handle_bot_command(
    action: BotAction,
    panel: &Panel,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    match action {
        BotAction::Start => handle_start(panel, presenter).await,
        BotAction::Status => {
            let status = panel.lifecycle().check_status().await;
            presenter.bot_status(&status);
            Ok(())
        }
        BotAction::Version => {
            match panel.lifecycle().check_version().await {
                Some(version) => presenter.output(&version),
                None => presenter.warn("Unable to detect the running version"),
            }
            Ok(())
        }
        BotAction::Versions => handle_versions(panel, presenter).await,
        BotAction::Update { version } => handle_update(panel, presenter, version).await,
        BotAction::Watch { interval } => handle_watch(panel, presenter, interval).await,
    }
}

async fn handle_start(panel: &Panel, presenter: &mut Presenter) -> Result<(), CliError> {
    panel.load().await?;

    let lifecycle = panel.lifecycle();
    let report = with_spinner(
        presenter,
        lifecycle.start_slot(),
        "Starting PoaBot...",
        lifecycle.start(),
    )
    .await?;

    if report.proxy_active {
        presenter.info(&format!(
            "Listening on port {} behind the reverse proxy",
            report.host_port
        ));
    } else {
        presenter.info(&format!("Listening on port {}", report.host_port));
    }
    Ok(())
}

async fn fetch_versions(panel: &Panel, presenter: &mut Presenter) -> Result<VersionListing, CliError> {
    let lifecycle = panel.lifecycle();
    let listing = with_spinner(
        presenter,
        lifecycle.list_slot(),
        "Checking available versions...",
        lifecycle.list_available_versions(),
    )
    .await?;

    if listing.is_degraded() {
        presenter.warn("Showing the built-in version list");
    }
    Ok(listing)
}

async fn handle_versions(panel: &Panel, presenter: &mut Presenter) -> Result<(), CliError> {
    let listing = fetch_versions(panel, presenter).await?;
    let current = panel.lifecycle().check_version().await;

    for version in listing.versions() {
        if current.as_deref() == Some(version.as_str()) {
            presenter.output(&format!("{version} (current)"));
        } else {
            presenter.output(version);
        }
    }
    Ok(())
}

async fn handle_update(
    panel: &Panel,
    presenter: &mut Presenter,
    version: Option<String>,
) -> Result<(), CliError> {
    let version = match version {
        Some(version) => version,
        None => {
            let listing = fetch_versions(panel, presenter).await?;
            // The built-in list is a hint, never an implicit update target.
            if listing.is_degraded() {
                return Err(CliError::Usage(
                    "Version list unavailable; pass an explicit version".to_string(),
                ));
            }
            listing
                .selected()
                .map(str::to_string)
                .ok_or_else(|| CliError::Usage("No versions available".to_string()))?
        }
    };

    let lifecycle = panel.lifecycle();
    let report = with_spinner(
        presenter,
        lifecycle.update_slot(),
        &format!("Updating to {version}..."),
        lifecycle.update(&version),
    )
    .await?;

    presenter.step("Panel tooling installed", &report.tooling);
    Ok(())
}

async fn handle_watch(panel: &Panel, presenter: &Presenter, interval: u64) -> Result<(), CliError> {
    if interval == 0 {
        return Err(CliError::Usage("Interval must be at least 1 second".to_string()));
    }

    let mut shutdown = ShutdownSignal::new()?;
    presenter.info(&format!("Checking status every {interval}s, Ctrl+C to stop"));

    panel.start_status_poll(Duration::from_secs(interval), |status| {
        Presenter::new().bot_status(&status);
    });

    let reason = shutdown.recv().await;
    panel.stop_status_poll();
    tracing::debug!(?reason, "Status watch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::ports::RegistryError;
    use crate::application::test_support::{MemoryFs, MockRunner, StaticRegistry, StaticReleases};
    use crate::application::PanelPorts;
    use crate::domain::PanelSettings;

    fn panel(runner: Arc<MockRunner>, registry: StaticRegistry) -> Panel {
        Panel::new(
            &PanelSettings::defaults(),
            PanelPorts {
                runner,
                fs: Arc::new(MemoryFs::new()),
                registry: Arc::new(registry),
                releases: Arc::new(StaticReleases::tags(&["v1.4.2"])),
            },
        )
    }

    #[tokio::test]
    async fn update_without_version_refuses_fallback_list() {
        let runner = Arc::new(MockRunner::new());
        let registry = StaticRegistry(Err(RegistryError::HttpStatus { status: 503 }));
        let panel = panel(runner.clone(), registry);
        let mut presenter = Presenter::new();

        let err = handle_bot_command(BotAction::Update { version: None }, &panel, &mut presenter)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Usage(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(!runner.called("podman pull"));
        assert!(!runner.called("podman tag"));
    }

    #[tokio::test]
    async fn update_without_version_takes_newest_published_tag() {
        let runner = Arc::new(MockRunner::new());
        let registry = StaticRegistry::tags(&["1.2.0", "latest", "1.10.1", "1.9.3"]);
        let panel = panel(runner.clone(), registry);
        let mut presenter = Presenter::new();

        handle_bot_command(BotAction::Update { version: None }, &panel, &mut presenter)
            .await
            .unwrap();

        assert!(runner.called("podman pull"));
        assert!(runner
            .calls()
            .iter()
            .any(|c| c.starts_with("podman pull") && c.contains("1.10.1")));
    }
}
