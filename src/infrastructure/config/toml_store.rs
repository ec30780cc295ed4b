//! TOML settings store adapter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::SettingsStore;
use crate::domain::config::PanelSettings;
use crate::domain::error::ConfigError;

/// System-wide settings path used when running as root
const SYSTEM_SETTINGS_PATH: &str = "/etc/poabot-panel/settings.toml";

/// Settings stored as a TOML file
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Create a store at the default path: `/etc/poabot-panel/settings.toml` for root,
    /// the user config directory otherwise
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn default_path() -> PathBuf {
        if is_root() {
            return PathBuf::from(SYSTEM_SETTINGS_PATH);
        }
        dirs::config_dir()
            .map(|d| d.join("poabot-panel").join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from(SYSTEM_SETTINGS_PATH))
    }

    fn parse_toml(content: &str) -> Result<PanelSettings, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn to_toml(settings: &PanelSettings) -> Result<String, ConfigError> {
        toml::to_string_pretty(settings).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for TomlSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn load(&self) -> Result<PanelSettings, ConfigError> {
        if !self.exists() {
            return Ok(PanelSettings::empty());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::parse_toml(&content)
    }

    async fn save(&self, settings: &PanelSettings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content = Self::to_toml(settings)?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        self.save(&PanelSettings::defaults()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn custom_path() {
        let store = TomlSettingsStore::with_path("/custom/settings.toml");
        assert_eq!(store.path(), PathBuf::from("/custom/settings.toml"));
    }

    #[test]
    fn default_path_names_the_panel() {
        let path = TomlSettingsStore::new().path();
        assert!(path.to_string_lossy().contains("poabot-panel"));
        assert!(path.to_string_lossy().ends_with("settings.toml"));
    }

    #[test]
    fn parse_partial_file() {
        let content = r#"
env_file = "/srv/poabot.env"
public_port = 8080

[proxy]
service = "caddy2"
"#;

        let settings = TomlSettingsStore::parse_toml(content).unwrap();
        assert_eq!(settings.env_file, Some(PathBuf::from("/srv/poabot.env")));
        assert_eq!(settings.public_port, Some(8080));
        assert_eq!(settings.proxy_service_or_default(), "caddy2");
        assert_eq!(settings.container_name, None);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let err = TomlSettingsStore::parse_toml("public_port = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::with_path(dir.path().join("settings.toml"));

        let settings = store.load().await.unwrap();
        assert!(settings.env_file.is_none());
    }

    #[tokio::test]
    async fn init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::with_path(dir.path().join("nested").join("settings.toml"));

        store.init().await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.container_name_or_default(), "poabot");
        assert_eq!(loaded.public_port, Some(80));

        assert!(matches!(
            store.init().await.unwrap_err(),
            ConfigError::AlreadyExists(_)
        ));
    }
}
