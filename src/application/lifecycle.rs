//! Bot lifecycle use case: start, status, version detection and update

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::config::{DISCORD_WEBHOOK_URL, PASSWORD};
use crate::domain::error::{
    AlreadyUpToDate, ConfigNotLoaded, MissingRequiredConfig, OperationInProgress,
};
use crate::domain::operation::{OperationKind, StepOutcome};
use crate::domain::version::{self, LATEST_TAG};

use super::ports::{CommandError, CommandRunner, ImageRegistry, ReleaseError, ReleaseSource};
use super::slot::{OperationSlot, LONG_RESET, SHORT_RESET};
use super::SharedStore;

/// Offered when the registry cannot be reached
pub const FALLBACK_VERSIONS: &[&str] = &["1.0.0"];

/// Where downloaded tooling packages are staged before install
const PACKAGE_DIR: &str = "/tmp";

/// Errors from the lifecycle use cases
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    InProgress(#[from] OperationInProgress),

    #[error(transparent)]
    NotLoaded(#[from] ConfigNotLoaded),

    #[error(transparent)]
    MissingConfig(#[from] MissingRequiredConfig),

    #[error(transparent)]
    AlreadyUpToDate(#[from] AlreadyUpToDate),

    #[error("Select a version to update to")]
    NoVersionSelected,

    #[error("Container command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Failed to list tooling releases: {0}")]
    Releases(#[from] ReleaseError),

    #[error("No installable tooling release for version {0}")]
    NoToolingRelease(String),
}

/// Container and host settings the lifecycle works against
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub container_name: String,
    pub image: String,
    pub container_port: u16,
    pub public_port: u16,
    pub env_file: PathBuf,
    pub log_dir: PathBuf,
    pub proxy_service: String,
    /// Install the matching panel tooling package on update
    pub tooling: bool,
}

/// Coarse container state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Running,
    Stopped,
    Unknown,
}

/// Result of a status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotStatus {
    pub state: BotState,
    pub message: String,
    /// Detected release version of the running image
    pub version: Option<String>,
}

/// Output from a successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    /// Host port the container's HTTP port is published on
    pub host_port: u16,
    pub proxy_active: bool,
}

/// Output from a successful update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub version: String,
    pub tooling: StepOutcome,
}

/// Available versions, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionListing {
    Fresh(Vec<String>),
    /// The registry query failed; a fixed list is offered instead
    DegradedFallback { versions: Vec<String>, reason: String },
}

impl VersionListing {
    pub fn versions(&self) -> &[String] {
        match self {
            Self::Fresh(versions) => versions,
            Self::DegradedFallback { versions, .. } => versions,
        }
    }

    /// Default selection: the newest version
    pub fn selected(&self) -> Option<&str> {
        self.versions().first().map(String::as_str)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::DegradedFallback { .. })
    }
}

/// Bot lifecycle controller
pub struct BotLifecycle {
    runner: Arc<dyn CommandRunner>,
    registry: Arc<dyn ImageRegistry>,
    releases: Arc<dyn ReleaseSource>,
    store: SharedStore,
    settings: LifecycleSettings,
    version: Arc<Mutex<Option<String>>>,
    recheck: Mutex<Option<JoinHandle<()>>>,
    start_slot: OperationSlot,
    update_slot: OperationSlot,
    list_slot: OperationSlot,
}

impl BotLifecycle {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        registry: Arc<dyn ImageRegistry>,
        releases: Arc<dyn ReleaseSource>,
        store: SharedStore,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            runner,
            registry,
            releases,
            store,
            settings,
            version: Arc::new(Mutex::new(None)),
            recheck: Mutex::new(None),
            start_slot: OperationSlot::new(OperationKind::Start, Some(SHORT_RESET)),
            update_slot: OperationSlot::new(OperationKind::Update, Some(LONG_RESET)),
            list_slot: OperationSlot::new(OperationKind::VersionList, None),
        }
    }

    pub fn start_slot(&self) -> &OperationSlot {
        &self.start_slot
    }

    pub fn update_slot(&self) -> &OperationSlot {
        &self.update_slot
    }

    pub fn list_slot(&self) -> &OperationSlot {
        &self.list_slot
    }

    /// Last detected version
    pub fn current_version(&self) -> Option<String> {
        self.version
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Abort the pending version re-check and every slot's reset timer
    pub fn shutdown(&self) {
        if let Some(task) = self
            .recheck
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.start_slot.shutdown();
        self.update_slot.shutdown();
        self.list_slot.shutdown();
    }

    /// Replace the running container with a fresh one from the `latest` image
    pub async fn start(&self) -> Result<StartReport, LifecycleError> {
        let guard = self.start_slot.begin("Starting PoaBot...")?;

        match self.run_start().await {
            Ok(report) => {
                guard.succeed("PoaBot started");
                self.schedule_version_recheck();
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Start failed");
                guard.fail(format!("Failed to start PoaBot: {e}"));
                Err(e)
            }
        }
    }

    async fn run_start(&self) -> Result<StartReport, LifecycleError> {
        let config = self
            .store
            .lock()
            .await
            .config()
            .cloned()
            .ok_or(ConfigNotLoaded)?;

        let mut missing = Vec::new();
        if config.text(PASSWORD).trim().is_empty() {
            missing.push("Password".to_string());
        }
        if config.text(DISCORD_WEBHOOK_URL).trim().is_empty() {
            missing.push("Discord Webhook URL".to_string());
        }
        if !missing.is_empty() {
            return Err(MissingRequiredConfig { fields: missing }.into());
        }

        let s = &self.settings;
        let proxy_active = self.proxy_active().await;
        let host_port = if proxy_active {
            s.container_port
        } else {
            s.public_port
        };
        info!(host_port, proxy_active, "Launching container");

        self.runner
            .run(&["podman", "rm", "--force", "--ignore", &s.container_name])
            .await?;

        let publish = format!("{}:{}", host_port, s.container_port);
        let env_file = s.env_file.display().to_string();
        let volume = format!("{}:/app/logs", s.log_dir.display());
        let image = format!("{}:{}", s.image, LATEST_TAG);
        self.runner
            .run(&[
                "podman",
                "run",
                "-d",
                "--name",
                &s.container_name,
                "-p",
                &publish,
                "--env-file",
                &env_file,
                "-v",
                &volume,
                "--restart",
                "always",
                &image,
            ])
            .await?;

        Ok(StartReport {
            host_port,
            proxy_active,
        })
    }

    async fn proxy_active(&self) -> bool {
        match self
            .runner
            .output(&["systemctl", "is-active", &self.settings.proxy_service])
            .await
        {
            Ok(output) => output.stdout.trim() == "active",
            Err(e) => {
                debug!(error = %e, "Could not query proxy service state");
                false
            }
        }
    }

    fn schedule_version_recheck(&self) {
        let runner = Arc::clone(&self.runner);
        let name = self.settings.container_name.clone();
        let cache = Arc::clone(&self.version);

        let task = tokio::spawn(async move {
            let detected = probe_version(runner.as_ref(), &name).await;
            *cache.lock().unwrap_or_else(PoisonError::into_inner) = detected;
        });

        let mut slot = self.recheck.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Query the runtime for the managed container.
    ///
    /// Never fails; a runtime error is reported as [`BotState::Unknown`].
    pub async fn check_status(&self) -> BotStatus {
        let filter = format!("name=^{}$", self.settings.container_name);
        let result = self
            .runner
            .run(&["podman", "ps", "--filter", &filter, "--format", "{{.Status}}"])
            .await;

        match result {
            Ok(out) if !out.trim().is_empty() => {
                let version = self.check_version().await;
                BotStatus {
                    state: BotState::Running,
                    message: format!("PoaBot is running: {}", out.trim()),
                    version,
                }
            }
            Ok(_) => BotStatus {
                state: BotState::Stopped,
                message: "PoaBot is not running".to_string(),
                version: None,
            },
            Err(e) => {
                warn!(error = %e, "Status query failed");
                BotStatus {
                    state: BotState::Unknown,
                    message: "Unable to determine PoaBot status".to_string(),
                    version: None,
                }
            }
        }
    }

    /// Detect the release version of the running container's image
    pub async fn check_version(&self) -> Option<String> {
        let detected = probe_version(self.runner.as_ref(), &self.settings.container_name).await;
        *self.version.lock().unwrap_or_else(PoisonError::into_inner) = detected.clone();
        detected
    }

    /// Published versions, newest first, with a fixed fallback when the registry fails
    pub async fn list_available_versions(&self) -> Result<VersionListing, OperationInProgress> {
        let guard = self.list_slot.begin("Checking available versions...")?;

        match self.registry.list_tags().await {
            Ok(tags) => {
                let mut versions: Vec<String> =
                    tags.into_iter().filter(|t| t != LATEST_TAG).collect();
                version::sort_descending(&mut versions);
                guard.succeed(format!("{} versions available", versions.len()));
                Ok(VersionListing::Fresh(versions))
            }
            Err(e) => {
                warn!(error = %e, "Registry query failed, offering fallback versions");
                let reason = format!("Failed to fetch versions: {e}");
                guard.fail(reason.clone());
                Ok(VersionListing::DegradedFallback {
                    versions: FALLBACK_VERSIONS.iter().map(|v| v.to_string()).collect(),
                    reason,
                })
            }
        }
    }

    /// Pull `version`, retag it as `latest` and install the matching tooling
    pub async fn update(&self, version: &str) -> Result<UpdateReport, LifecycleError> {
        let version = version.trim();
        let guard = self.update_slot.begin(format!("Updating to {version}..."))?;

        match self.run_update(version).await {
            Ok(report) => {
                guard.succeed(format!("Updated to {version}"));
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, version, "Update failed");
                guard.fail(format!("Update failed: {e}"));
                Err(e)
            }
        }
    }

    async fn run_update(&self, version: &str) -> Result<UpdateReport, LifecycleError> {
        if version.is_empty() {
            return Err(LifecycleError::NoVersionSelected);
        }

        if self.check_version().await.as_deref() == Some(version) {
            return Err(AlreadyUpToDate {
                version: version.to_string(),
            }
            .into());
        }

        let image = &self.settings.image;
        let target = format!("{image}:{version}");
        let latest = format!("{image}:{LATEST_TAG}");

        info!(%target, "Pulling image");
        self.runner.run(&["podman", "pull", &target]).await?;
        self.runner.run(&["podman", "tag", &target, &latest]).await?;

        let tooling = if self.settings.tooling {
            self.install_tooling(version).await?;
            StepOutcome::Applied
        } else {
            StepOutcome::Skipped
        };

        Ok(UpdateReport {
            version: version.to_string(),
            tooling,
        })
    }

    async fn install_tooling(&self, version: &str) -> Result<(), LifecycleError> {
        let releases = self.releases.list_releases().await?;
        let tags: Vec<String> = releases
            .iter()
            .filter(|r| r.package_url.is_some())
            .map(|r| r.tag.clone())
            .collect();

        let chosen = version::select_compatible(&tags, version)
            .ok_or_else(|| LifecycleError::NoToolingRelease(version.to_string()))?;
        let url = releases
            .iter()
            .find(|r| r.tag == chosen)
            .and_then(|r| r.package_url.clone())
            .ok_or_else(|| LifecycleError::NoToolingRelease(version.to_string()))?;

        let package = format!("{PACKAGE_DIR}/poabot-panel-{chosen}.deb");
        info!(release = chosen, "Installing panel tooling");
        self.runner
            .run(&["curl", "-fsSL", "-o", &package, &url])
            .await?;
        self.runner.run(&["dpkg", "-i", &package]).await?;

        if let Err(e) = self.runner.run(&["rm", "-f", &package]).await {
            debug!(error = %e, "Could not remove downloaded package");
        }
        Ok(())
    }
}

/// Image ID of the container, then the release tag among the tags sharing that ID
async fn probe_version(runner: &dyn CommandRunner, container: &str) -> Option<String> {
    let image_id = match runner
        .run(&["podman", "inspect", "--format", "{{.Image}}", container])
        .await
    {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            debug!(error = %e, "Container image lookup failed");
            return None;
        }
    };
    if image_id.is_empty() {
        return None;
    }

    let tags = match runner
        .run(&[
            "podman",
            "image",
            "inspect",
            "--format",
            "{{range .RepoTags}}{{println .}}{{end}}",
            &image_id,
        ])
        .await
    {
        Ok(out) => out,
        Err(e) => {
            debug!(error = %e, "Image tag lookup failed");
            return None;
        }
    };

    let tags: Vec<String> = tags
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    version::version_from_repo_tags(&tags)
}
