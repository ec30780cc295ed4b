//! Composition root: owns the configuration store, the orchestrators and the status poller

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::config::{sanitize_field, ConfigStore, Configuration, PanelSettings, StoreUpdate};
use crate::domain::env_file;
use crate::domain::whitelist::{self, WhitelistValidation};

use super::domain_link::{DomainLink, DomainSettings};
use super::lifecycle::{BotLifecycle, BotStatus, LifecycleSettings};
use super::ports::{CommandRunner, FileError, ImageRegistry, PrivilegedFs, ReleaseSource};
use super::save::{SaveOrchestrator, SaveTargets};
use super::trigger::OrderTrigger;
use super::SharedStore;

/// Status poll period
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Adapters the panel runs against
pub struct PanelPorts {
    pub runner: Arc<dyn CommandRunner>,
    pub fs: Arc<dyn PrivilegedFs>,
    pub registry: Arc<dyn ImageRegistry>,
    pub releases: Arc<dyn ReleaseSource>,
}

/// The admin panel
pub struct Panel {
    store: SharedStore,
    fs: Arc<dyn PrivilegedFs>,
    env_file: PathBuf,
    save: Arc<SaveOrchestrator>,
    lifecycle: Arc<BotLifecycle>,
    domain: DomainLink,
    trigger: OrderTrigger,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Panel {
    pub fn new(settings: &PanelSettings, ports: PanelPorts) -> Self {
        let store: SharedStore = Arc::new(tokio::sync::Mutex::new(ConfigStore::new()));
        let env_file = settings.env_file_or_default();
        let proxy_config = settings.proxy_config_or_default();
        let proxy_service = settings.proxy_service_or_default().to_string();

        let save = Arc::new(SaveOrchestrator::new(
            Arc::clone(&ports.runner),
            Arc::clone(&ports.fs),
            Arc::clone(&store),
            SaveTargets {
                env_file: env_file.clone(),
                proxy_config: proxy_config.clone(),
                proxy_service: proxy_service.clone(),
            },
        ));

        let lifecycle = Arc::new(BotLifecycle::new(
            Arc::clone(&ports.runner),
            ports.registry,
            ports.releases,
            Arc::clone(&store),
            LifecycleSettings {
                container_name: settings.container_name_or_default().to_string(),
                image: settings.image_or_default().to_string(),
                container_port: settings.container_port_or_default(),
                public_port: settings.public_port_or_default(),
                env_file: env_file.clone(),
                log_dir: settings.log_dir_or_default(),
                proxy_service: proxy_service.clone(),
                tooling: settings.tooling_or_default(),
            },
        ));

        let domain = DomainLink::new(
            Arc::clone(&ports.runner),
            Arc::clone(&ports.fs),
            Arc::clone(&store),
            Arc::clone(&save),
            DomainSettings {
                proxy_config,
                proxy_service,
                origin_config: settings.origin_config_or_default(),
                management_service: settings.management_service_or_default().to_string(),
                bot_port: settings.container_port_or_default(),
            },
        );

        let trigger = OrderTrigger::new(
            ports.runner,
            Arc::clone(&store),
            settings.container_name_or_default(),
            settings.container_port_or_default(),
        );

        Self {
            store,
            fs: ports.fs,
            env_file,
            save,
            lifecycle,
            domain,
            trigger,
            poller: Mutex::new(None),
        }
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn env_file(&self) -> &PathBuf {
        &self.env_file
    }

    pub fn save(&self) -> &SaveOrchestrator {
        &self.save
    }

    pub fn lifecycle(&self) -> &BotLifecycle {
        &self.lifecycle
    }

    pub fn domain(&self) -> &DomainLink {
        &self.domain
    }

    pub fn trigger(&self) -> &OrderTrigger {
        &self.trigger
    }

    /// Load the env file into the store. A missing file loads an empty configuration.
    pub async fn load(&self) -> Result<Configuration, FileError> {
        match self.fs.read(&self.env_file).await {
            Ok(content) => {
                if content.is_none() {
                    warn!(path = %self.env_file.display(), "Env file not found, starting empty");
                }
                let map = env_file::parse(content.as_deref().unwrap_or(""));
                let mut store = self.store.lock().await;
                store.load(Configuration::from_env(&map));
                info!(keys = map.len(), "Configuration loaded");
                Ok(store.config().cloned().unwrap_or_default())
            }
            Err(e) => {
                self.store.lock().await.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Set one key in memory; values are trimmed and PASSWORD is filtered
    pub async fn edit(&self, key: &str, value: &str) -> StoreUpdate {
        let value = sanitize_field(key, value);
        self.store.lock().await.update(key, &value)
    }

    /// The stored allow-list as editable text
    pub async fn whitelist_input(&self) -> Option<String> {
        let store = self.store.lock().await;
        store.config().map(|c| whitelist::to_input(c.whitelist()))
    }

    pub fn validate_whitelist(input: &str) -> WhitelistValidation {
        whitelist::validate(input)
    }

    /// Check status now, then every `interval`, until stopped or the panel is dropped
    pub fn start_status_poll<F>(&self, interval: Duration, on_status: F)
    where
        F: Fn(BotStatus) + Send + Sync + 'static,
    {
        let lifecycle = Arc::clone(&self.lifecycle);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                on_status(lifecycle.check_status().await);
            }
        });

        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = poller.replace(task) {
            previous.abort();
        }
    }

    pub fn stop_status_poll(&self) {
        if let Some(task) = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.stop_status_poll();
        self.save.slot().shutdown();
        self.lifecycle.shutdown();
        self.domain.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{MemoryFs, MockRunner, StaticRegistry, StaticReleases};
    use crate::domain::config::{DISCORD_WEBHOOK_URL, PASSWORD, WHITELIST};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ENV: &str = "/root/poabot.env";

    fn panel(runner: Arc<MockRunner>, fs: Arc<MemoryFs>) -> Panel {
        Panel::new(
            &PanelSettings::defaults(),
            PanelPorts {
                runner,
                fs,
                registry: Arc::new(StaticRegistry::tags(&[])),
                releases: Arc::new(StaticReleases::tags(&[])),
            },
        )
    }

    #[tokio::test]
    async fn load_parses_env_file() {
        let fs = Arc::new(MemoryFs::new().with_file(
            ENV,
            "# poabot\nPASSWORD=\"pw\"\nWHITELIST=\"[\"10.0.0.1\"]\"\n",
        ));
        let panel = panel(Arc::new(MockRunner::new()), fs);

        let config = panel.load().await.unwrap();
        assert_eq!(config.text(PASSWORD), "pw");
        assert_eq!(config.whitelist(), &["10.0.0.1".to_string()]);
        assert_eq!(panel.whitelist_input().await.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn missing_env_file_loads_empty() {
        let panel = panel(Arc::new(MockRunner::new()), Arc::new(MemoryFs::new()));

        let config = panel.load().await.unwrap();
        assert!(config.get(WHITELIST).is_some());
        assert!(!panel.store().lock().await.is_loading());
    }

    #[tokio::test]
    async fn edit_sanitizes_password() {
        let panel = panel(Arc::new(MockRunner::new()), Arc::new(MemoryFs::new()));
        panel.load().await.unwrap();

        assert_eq!(panel.edit(PASSWORD, "  pässw0rd! ").await, StoreUpdate::Applied);
        let store = panel.store();
        let store = store.lock().await;
        assert_eq!(store.config().unwrap().text(PASSWORD), "pssw0rd!");
    }

    #[tokio::test]
    async fn edit_before_load_is_refused() {
        let panel = panel(Arc::new(MockRunner::new()), Arc::new(MemoryFs::new()));
        assert_eq!(panel.edit(PASSWORD, "pw").await, StoreUpdate::NotLoaded);
    }

    #[tokio::test]
    async fn save_round_trips_through_env_file() {
        let fs = Arc::new(MemoryFs::new().with_file(ENV, "PASSWORD=\"pw\"\n"));
        let panel = panel(Arc::new(MockRunner::new()), fs.clone());
        panel.load().await.unwrap();

        panel.save().save("10.0.0.1, 10.0.0.2").await.unwrap();
        panel.load().await.unwrap();

        let store = panel.store();
        let store = store.lock().await;
        let config = store.config().unwrap();
        assert_eq!(config.text(PASSWORD), "pw");
        assert_eq!(
            config.whitelist(),
            &["10.0.0.1".to_string(), "10.0.0.2".to_string()]
        );
    }

    #[tokio::test]
    async fn edited_line_break_cannot_inject_keys() {
        let fs = Arc::new(MemoryFs::new().with_file(ENV, "PASSWORD=\"pw\"\n"));
        let panel = panel(Arc::new(MockRunner::new()), fs.clone());
        panel.load().await.unwrap();

        panel
            .edit(DISCORD_WEBHOOK_URL, "https://discord.test/a\nPASSWORD=hijacked")
            .await;
        panel.save().save("10.0.0.1").await.unwrap();

        let written = fs.content(ENV).unwrap();
        assert_eq!(written.lines().filter(|l| l.starts_with("PASSWORD=")).count(), 1);

        panel.load().await.unwrap();
        let store = panel.store();
        let store = store.lock().await;
        let config = store.config().unwrap();
        assert_eq!(config.text(PASSWORD), "pw");
        assert_eq!(
            config.text(DISCORD_WEBHOOK_URL),
            "https://discord.test/aPASSWORD=hijacked"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn status_poll_runs_until_dropped() {
        let runner = Arc::new(MockRunner::new().reply("podman ps", "Up 1 minute\n"));
        let panel = panel(runner.clone(), Arc::new(MemoryFs::new()));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        panel.start_status_poll(POLL_INTERVAL, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        drop(panel);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
