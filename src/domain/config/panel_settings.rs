//! Panel settings value object
//!
//! Where the panel finds the files and services it manages. These are the panel's own
//! settings, separate from the bot configuration kept in the env file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_ENV_FILE: &str = "/root/poabot.env";
const DEFAULT_LOG_DIR: &str = "/root/poabot-logs";
const DEFAULT_CONTAINER_NAME: &str = "poabot";
const DEFAULT_IMAGE: &str = "docker.io/jangdokang/poabot";
const DEFAULT_CONTAINER_PORT: u16 = 8000;
const DEFAULT_PUBLIC_PORT: u16 = 80;
const DEFAULT_REGISTRY_URL: &str =
    "https://hub.docker.com/v2/repositories/jangdokang/poabot/tags?page_size=100";
const DEFAULT_TOOLING_RELEASES_URL: &str =
    "https://api.github.com/repos/jangdokang/poabot-panel/releases";

const DEFAULT_PROXY_CONFIG: &str = "/etc/caddy/Caddyfile";
const DEFAULT_PROXY_SERVICE: &str = "caddy";
const DEFAULT_ORIGIN_CONFIG: &str = "/etc/cockpit/cockpit.conf";
const DEFAULT_MANAGEMENT_SERVICE: &str = "cockpit";

/// Reverse proxy and management service section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxySettings {
    pub config_path: Option<PathBuf>,
    pub service: Option<String>,
    pub origin_config_path: Option<PathBuf>,
    pub management_service: Option<String>,
}

/// Panel settings.
/// All fields are optional to support partial files and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelSettings {
    pub env_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub container_name: Option<String>,
    pub image: Option<String>,
    pub container_port: Option<u16>,
    pub public_port: Option<u16>,
    pub registry_url: Option<String>,
    pub tooling_releases_url: Option<String>,
    pub tooling: Option<bool>,
    pub proxy: Option<ProxySettings>,
}

impl PanelSettings {
    /// Create settings with default values
    pub fn defaults() -> Self {
        Self {
            env_file: Some(PathBuf::from(DEFAULT_ENV_FILE)),
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            container_name: Some(DEFAULT_CONTAINER_NAME.to_string()),
            image: Some(DEFAULT_IMAGE.to_string()),
            container_port: Some(DEFAULT_CONTAINER_PORT),
            public_port: Some(DEFAULT_PUBLIC_PORT),
            registry_url: Some(DEFAULT_REGISTRY_URL.to_string()),
            tooling_releases_url: Some(DEFAULT_TOOLING_RELEASES_URL.to_string()),
            tooling: Some(true),
            proxy: Some(ProxySettings {
                config_path: Some(PathBuf::from(DEFAULT_PROXY_CONFIG)),
                service: Some(DEFAULT_PROXY_SERVICE.to_string()),
                origin_config_path: Some(PathBuf::from(DEFAULT_ORIGIN_CONFIG)),
                management_service: Some(DEFAULT_MANAGEMENT_SERVICE.to_string()),
            }),
        }
    }

    /// Create empty settings (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            env_file: other.env_file.or(self.env_file),
            log_dir: other.log_dir.or(self.log_dir),
            container_name: other.container_name.or(self.container_name),
            image: other.image.or(self.image),
            container_port: other.container_port.or(self.container_port),
            public_port: other.public_port.or(self.public_port),
            registry_url: other.registry_url.or(self.registry_url),
            tooling_releases_url: other.tooling_releases_url.or(self.tooling_releases_url),
            tooling: other.tooling.or(self.tooling),
            proxy: Self::merge_proxy(self.proxy, other.proxy),
        }
    }

    fn merge_proxy(base: Option<ProxySettings>, other: Option<ProxySettings>) -> Option<ProxySettings> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(ProxySettings {
                config_path: o.config_path.or(b.config_path),
                service: o.service.or(b.service),
                origin_config_path: o.origin_config_path.or(b.origin_config_path),
                management_service: o.management_service.or(b.management_service),
            }),
        }
    }

    pub fn env_file_or_default(&self) -> PathBuf {
        self.env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
    }

    pub fn log_dir_or_default(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }

    pub fn container_name_or_default(&self) -> &str {
        self.container_name.as_deref().unwrap_or(DEFAULT_CONTAINER_NAME)
    }

    /// Image reference without a tag
    pub fn image_or_default(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_IMAGE)
    }

    pub fn container_port_or_default(&self) -> u16 {
        self.container_port.unwrap_or(DEFAULT_CONTAINER_PORT)
    }

    pub fn public_port_or_default(&self) -> u16 {
        self.public_port.unwrap_or(DEFAULT_PUBLIC_PORT)
    }

    pub fn registry_url_or_default(&self) -> &str {
        self.registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL)
    }

    pub fn tooling_releases_url_or_default(&self) -> &str {
        self.tooling_releases_url
            .as_deref()
            .unwrap_or(DEFAULT_TOOLING_RELEASES_URL)
    }

    /// Whether updates also install the matching panel tooling, true if not set
    pub fn tooling_or_default(&self) -> bool {
        self.tooling.unwrap_or(true)
    }

    pub fn proxy_config_or_default(&self) -> PathBuf {
        self.proxy
            .as_ref()
            .and_then(|p| p.config_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROXY_CONFIG))
    }

    pub fn proxy_service_or_default(&self) -> &str {
        self.proxy
            .as_ref()
            .and_then(|p| p.service.as_deref())
            .unwrap_or(DEFAULT_PROXY_SERVICE)
    }

    pub fn origin_config_or_default(&self) -> PathBuf {
        self.proxy
            .as_ref()
            .and_then(|p| p.origin_config_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ORIGIN_CONFIG))
    }

    pub fn management_service_or_default(&self) -> &str {
        self.proxy
            .as_ref()
            .and_then(|p| p.management_service.as_deref())
            .unwrap_or(DEFAULT_MANAGEMENT_SERVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let settings = PanelSettings::defaults();
        assert_eq!(settings.env_file_or_default(), PathBuf::from("/root/poabot.env"));
        assert_eq!(settings.container_name_or_default(), "poabot");
        assert_eq!(settings.container_port_or_default(), 8000);
        assert_eq!(settings.public_port_or_default(), 80);
        assert_eq!(settings.proxy_service_or_default(), "caddy");
        assert_eq!(settings.management_service_or_default(), "cockpit");
        assert!(settings.tooling_or_default());
    }

    #[test]
    fn empty_has_all_none() {
        let settings = PanelSettings::empty();
        assert!(settings.env_file.is_none());
        assert!(settings.image.is_none());
        assert!(settings.proxy.is_none());
    }

    #[test]
    fn accessors_fall_back_on_empty() {
        let settings = PanelSettings::empty();
        assert_eq!(settings.image_or_default(), "docker.io/jangdokang/poabot");
        assert_eq!(
            settings.proxy_config_or_default(),
            PathBuf::from("/etc/caddy/Caddyfile")
        );
        assert_eq!(
            settings.origin_config_or_default(),
            PathBuf::from("/etc/cockpit/cockpit.conf")
        );
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = PanelSettings::defaults();
        let other = PanelSettings {
            env_file: Some(PathBuf::from("/tmp/bot.env")),
            public_port: Some(8080),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.env_file_or_default(), PathBuf::from("/tmp/bot.env"));
        assert_eq!(merged.public_port_or_default(), 8080);
        assert_eq!(merged.container_name_or_default(), "poabot");
    }

    #[test]
    fn merge_proxy_section_field_by_field() {
        let base = PanelSettings::defaults();
        let other = PanelSettings {
            proxy: Some(ProxySettings {
                service: Some("nginx".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.proxy_service_or_default(), "nginx");
        assert_eq!(
            merged.proxy_config_or_default(),
            PathBuf::from("/etc/caddy/Caddyfile")
        );
    }

    #[test]
    fn merge_preserves_base_when_other_is_empty() {
        let base = PanelSettings {
            tooling: Some(false),
            ..Default::default()
        };
        let merged = base.merge(PanelSettings::empty());
        assert!(!merged.tooling_or_default());
    }
}
