//! Domain connection use case
//!
//! DNS check, then: save, bind the reverse proxy to the domain, point the management
//! service's origin allow-list at it, restart both services. No step is rolled back when
//! a later one fails.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::dns::{self, DnsVerdict};
use crate::domain::error::{ConfigNotLoaded, OperationInProgress, ProxyConfigUnrecognized};
use crate::domain::operation::OperationKind;
use crate::domain::proxy::{caddyfile, origins};

use super::ports::{CommandError, CommandRunner, FileError, PrivilegedFs};
use super::save::{SaveError, SaveOrchestrator, SaveReport};
use super::slot::{OperationSlot, LONG_RESET, SHORT_RESET};
use super::SharedStore;

/// Port the management service listens on behind the proxy
pub const MANAGEMENT_PORT: u16 = 9090;

/// Errors from the DNS check and domain connection
#[derive(Debug, Error)]
pub enum DomainLinkError {
    #[error(transparent)]
    InProgress(#[from] OperationInProgress),

    #[error(transparent)]
    NotLoaded(#[from] ConfigNotLoaded),

    #[error("No domain is set. Enter a domain first")]
    NoDomain,

    #[error("DNS for {0} is not verified. Run the DNS check first")]
    DnsNotVerified(String),

    #[error("DNS lookup failed: {0}")]
    Lookup(CommandError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Unrecognized(#[from] ProxyConfigUnrecognized),

    #[error("Service restart failed: {0}")]
    Restart(#[from] CommandError),
}

/// Files and services the domain connection rewrites
#[derive(Debug, Clone)]
pub struct DomainSettings {
    pub proxy_config: PathBuf,
    pub proxy_service: String,
    pub origin_config: PathBuf,
    pub management_service: String,
    /// Bot HTTP port the proxy forwards to
    pub bot_port: u16,
}

/// Output from a DNS check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsReport {
    pub domain: String,
    pub host_address: String,
    pub records: Vec<String>,
    pub verdict: DnsVerdict,
}

/// Output from a domain connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectReport {
    pub domain: String,
    pub save: SaveReport,
    /// The proxy config did not exist and a default one was written
    pub proxy_created: bool,
    /// The origin config did not exist and a default one was written
    pub origins_created: bool,
}

/// DNS check and domain connection orchestrator
pub struct DomainLink {
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn PrivilegedFs>,
    store: SharedStore,
    save: Arc<SaveOrchestrator>,
    settings: DomainSettings,
    verified: Mutex<Option<String>>,
    dns_slot: OperationSlot,
    connect_slot: OperationSlot,
}

impl DomainLink {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn PrivilegedFs>,
        store: SharedStore,
        save: Arc<SaveOrchestrator>,
        settings: DomainSettings,
    ) -> Self {
        Self {
            runner,
            fs,
            store,
            save,
            settings,
            verified: Mutex::new(None),
            dns_slot: OperationSlot::new(OperationKind::DnsCheck, Some(SHORT_RESET)),
            connect_slot: OperationSlot::new(OperationKind::DomainConnect, Some(LONG_RESET)),
        }
    }

    pub fn dns_slot(&self) -> &OperationSlot {
        &self.dns_slot
    }

    pub fn connect_slot(&self) -> &OperationSlot {
        &self.connect_slot
    }

    pub fn shutdown(&self) {
        self.dns_slot.shutdown();
        self.connect_slot.shutdown();
    }

    /// Whether the last DNS check passed for `domain`
    pub fn is_dns_valid(&self, domain: &str) -> bool {
        self.verified
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(domain)
    }

    fn set_verified(&self, domain: Option<String>) {
        *self.verified.lock().unwrap_or_else(PoisonError::into_inner) = domain;
    }

    /// The host's primary address, empty when it cannot be determined
    pub async fn server_ip(&self) -> String {
        match self.runner.run(&["hostname", "-I"]).await {
            Ok(out) => dns::primary_address(&out),
            Err(e) => {
                warn!(error = %e, "Could not determine server address");
                String::new()
            }
        }
    }

    async fn configured_domain(&self) -> Result<String, DomainLinkError> {
        let store = self.store.lock().await;
        let domain = store.config().ok_or(ConfigNotLoaded)?.domain().to_string();
        if domain.is_empty() {
            return Err(DomainLinkError::NoDomain);
        }
        Ok(domain)
    }

    /// Check that the configured domain's A records include this host
    pub async fn check_dns(&self) -> Result<DnsReport, DomainLinkError> {
        let guard = self.dns_slot.begin("Checking DNS...")?;
        self.set_verified(None);

        match self.run_dns_check().await {
            Ok(report) => {
                if report.verdict.is_valid() {
                    self.set_verified(Some(report.domain.clone()));
                    guard.succeed(report.verdict.to_string());
                } else {
                    guard.fail(report.verdict.to_string());
                }
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "DNS check failed");
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_dns_check(&self) -> Result<DnsReport, DomainLinkError> {
        let domain = self.configured_domain().await?;

        let host = self
            .runner
            .run(&["hostname", "-I"])
            .await
            .map_err(DomainLinkError::Lookup)?;
        let host_address = dns::primary_address(&host);

        let answer = self
            .runner
            .run(&["dig", "+short", &domain, "A"])
            .await
            .map_err(DomainLinkError::Lookup)?;
        let records = dns::a_records(&answer);

        let verdict = dns::verdict(&host_address, &records);
        info!(%domain, %host_address, records = ?records, valid = verdict.is_valid(), "DNS checked");

        Ok(DnsReport {
            domain,
            host_address,
            records,
            verdict,
        })
    }

    /// Save, then wire the proxy and management service to the configured domain
    pub async fn connect(&self, whitelist_input: &str) -> Result<ConnectReport, DomainLinkError> {
        let guard = self.connect_slot.begin("Connecting domain...")?;

        match self.run_connect(whitelist_input).await {
            Ok(report) => {
                guard.succeed(format!("{} connected", report.domain));
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Domain connection failed");
                guard.fail(format!("Domain connection failed: {e}"));
                Err(e)
            }
        }
    }

    async fn run_connect(&self, whitelist_input: &str) -> Result<ConnectReport, DomainLinkError> {
        let domain = self.configured_domain().await?;
        if !self.is_dns_valid(&domain) {
            return Err(DomainLinkError::DnsNotVerified(domain));
        }

        let save = self.save.save(whitelist_input).await?;

        let s = &self.settings;
        let proxy_created = match self.fs.read(&s.proxy_config).await? {
            Some(current) => {
                let rebound = caddyfile::rebind_host(&current, &domain)?;
                self.fs.replace(&s.proxy_config, &rebound).await?;
                false
            }
            None => {
                let fresh = caddyfile::render_default(&domain, s.bot_port, MANAGEMENT_PORT);
                let fresh = caddyfile::update_whitelist_clause(&fresh, &save.whitelist)?;
                self.fs.replace(&s.proxy_config, &fresh).await?;
                true
            }
        };
        info!(path = %s.proxy_config.display(), created = proxy_created, "Proxy bound to domain");

        let origins_created = match self.fs.read(&s.origin_config).await? {
            Some(current) => {
                let rewritten = origins::rewrite_origins(&current, &domain)?;
                self.fs.replace(&s.origin_config, &rewritten).await?;
                false
            }
            None => {
                self.fs
                    .replace(&s.origin_config, &origins::render_default(&domain))
                    .await?;
                true
            }
        };
        info!(path = %s.origin_config.display(), created = origins_created, "Origins updated");

        self.runner
            .run(&["systemctl", "restart", &s.proxy_service])
            .await?;
        self.runner
            .run(&["systemctl", "restart", &s.management_service])
            .await?;

        Ok(ConnectReport {
            domain,
            save,
            proxy_created,
            origins_created,
        })
    }
}
