//! Save settings use case
//!
//! Validate the allow-list, persist the env file, then best-effort sync the
//! reverse proxy's whitelist clause and reload it.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::env_file::{self, UnsafeValue};
use crate::domain::error::{ConfigNotLoaded, OperationInProgress, ProxyConfigUnrecognized};
use crate::domain::operation::{OperationKind, StepOutcome};
use crate::domain::proxy::update_whitelist_clause;
use crate::domain::whitelist;

use super::ports::{CommandError, CommandRunner, FileError, PrivilegedFs};
use super::slot::{OperationSlot, SHORT_RESET};
use super::SharedStore;

/// Errors from the save use case
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    InProgress(#[from] OperationInProgress),

    #[error(transparent)]
    NotLoaded(#[from] ConfigNotLoaded),

    #[error("{message}")]
    InvalidWhitelist {
        invalid_ips: Vec<String>,
        message: String,
    },

    #[error("Failed to save settings: {0}")]
    Persist(#[from] FileError),

    #[error("Refusing to save settings: {0}")]
    Encode(#[from] UnsafeValue),
}

/// Why the proxy sync step did not apply
#[derive(Debug, Error)]
enum ProxySyncError {
    #[error("proxy config not found at {0}")]
    Missing(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Unrecognized(#[from] ProxyConfigUnrecognized),

    #[error("proxy reload failed: {0}")]
    Reload(#[from] CommandError),
}

/// Where a save writes to
#[derive(Debug, Clone)]
pub struct SaveTargets {
    pub env_file: PathBuf,
    pub proxy_config: PathBuf,
    pub proxy_service: String,
}

/// Output from the save use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Persisted allow-list, `[""]` when blank
    pub whitelist: Vec<String>,
    /// Whether the allow-list differs from the previously persisted one
    pub whitelist_changed: bool,
    pub proxy_sync: StepOutcome,
}

/// Save orchestrator
pub struct SaveOrchestrator {
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn PrivilegedFs>,
    store: SharedStore,
    targets: SaveTargets,
    slot: OperationSlot,
}

impl SaveOrchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn PrivilegedFs>,
        store: SharedStore,
        targets: SaveTargets,
    ) -> Self {
        Self {
            runner,
            fs,
            store,
            targets,
            slot: OperationSlot::new(OperationKind::Save, Some(SHORT_RESET)),
        }
    }

    pub fn slot(&self) -> &OperationSlot {
        &self.slot
    }

    /// Persist the current configuration with `whitelist_input` as its allow-list
    pub async fn save(&self, whitelist_input: &str) -> Result<SaveReport, SaveError> {
        let guard = self.slot.begin("Saving settings...")?;

        match self.run(whitelist_input).await {
            Ok(report) => {
                guard.succeed("Settings saved");
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Save failed");
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, whitelist_input: &str) -> Result<SaveReport, SaveError> {
        let validation = whitelist::validate(whitelist_input);
        if !validation.is_valid && !whitelist_input.trim().is_empty() {
            return Err(SaveError::InvalidWhitelist {
                invalid_ips: validation.invalid_ips,
                message: validation.message,
            });
        }

        let normalized = whitelist::normalize(whitelist_input);
        let snapshot = self
            .store
            .lock()
            .await
            .config()
            .cloned()
            .ok_or(ConfigNotLoaded)?;
        let whitelist_changed = !whitelist::same_entries(snapshot.whitelist(), &normalized);

        let updated = snapshot.with_whitelist(normalized.clone());
        let content = env_file::serialize(&updated.to_env())?;
        self.fs.replace(&self.targets.env_file, &content).await?;
        info!(path = %self.targets.env_file.display(), "Env file written");

        let proxy_sync = if whitelist_changed {
            match self.sync_proxy(&normalized).await {
                Ok(()) => StepOutcome::Applied,
                Err(e) => {
                    warn!(error = %e, "Proxy whitelist sync skipped");
                    StepOutcome::Degraded(e.to_string())
                }
            }
        } else {
            StepOutcome::Skipped
        };

        self.store.lock().await.load(updated);

        Ok(SaveReport {
            whitelist: normalized,
            whitelist_changed,
            proxy_sync,
        })
    }

    async fn sync_proxy(&self, whitelist: &[String]) -> Result<(), ProxySyncError> {
        let path = &self.targets.proxy_config;
        let current = self
            .fs
            .read(path)
            .await?
            .ok_or_else(|| ProxySyncError::Missing(path.display().to_string()))?;

        let updated = update_whitelist_clause(&current, whitelist)?;
        if updated != current {
            self.fs.replace(path, &updated).await?;
        }

        self.runner
            .run(&["systemctl", "restart", &self.targets.proxy_service])
            .await?;
        info!(service = %self.targets.proxy_service, "Proxy whitelist updated");
        Ok(())
    }
}
