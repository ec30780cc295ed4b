//! Config, save and settings command handlers

use crate::application::ports::SettingsStore;
use crate::application::{Panel, SaveReport};
use crate::domain::config::{is_secret_key, ConfigValue, StoreUpdate, KNOWN_KEYS, WHITELIST};
use crate::domain::error::{ConfigError, ConfigNotLoaded};
use crate::domain::whitelist;

use super::app::{load_settings, with_spinner, CliError};
use super::args::{ConfigAction, SettingsAction};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command(
    action: ConfigAction,
    panel: &Panel,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    match action {
        ConfigAction::Show { reveal } => handle_show(panel, presenter, reveal).await,
        ConfigAction::Get { key } => handle_get(panel, presenter, &key).await,
        ConfigAction::Set { key, value } => handle_set(panel, presenter, &key, &value).await,
        ConfigAction::Keys => {
            for key in KNOWN_KEYS {
                presenter.output(key);
            }
            Ok(())
        }
        ConfigAction::CheckWhitelist { input } => handle_check_whitelist(presenter, &input),
    }
}

async fn handle_show(panel: &Panel, presenter: &Presenter, reveal: bool) -> Result<(), CliError> {
    let config = panel.load().await?;
    presenter.info(&format!("Env file: {}", panel.env_file().display()));

    for (key, value) in config.iter() {
        presenter.key_value(key, &display_value(key, value, reveal));
    }
    Ok(())
}

async fn handle_get(panel: &Panel, presenter: &Presenter, key: &str) -> Result<(), CliError> {
    let config = panel.load().await?;

    match config.get(key) {
        Some(value) => presenter.output(&display_value(key, value, false)),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

async fn handle_set(
    panel: &Panel,
    presenter: &mut Presenter,
    key: &str,
    value: &str,
) -> Result<(), CliError> {
    validate_key(key)?;
    panel.load().await?;

    match panel.edit(key, value).await {
        StoreUpdate::Applied => {}
        StoreUpdate::Rejected(message) => {
            return Err(ConfigError::ValidationError {
                key: key.to_string(),
                message,
            }
            .into())
        }
        StoreUpdate::NotLoaded => return Err(ConfigNotLoaded.into()),
    }

    let whitelist = panel.whitelist_input().await.unwrap_or_default();
    let report = save_with_spinner(panel, presenter, &whitelist).await?;
    report_save(&report, presenter);

    let stored = panel
        .store()
        .lock()
        .await
        .config()
        .and_then(|c| c.get(key).cloned());
    match stored {
        Some(stored) => presenter.success(&format!("{} = {}", key, display_value(key, &stored, false))),
        None => presenter.success(&format!("{} updated", key)),
    }
    Ok(())
}

fn handle_check_whitelist(presenter: &Presenter, input: &str) -> Result<(), CliError> {
    let validation = Panel::validate_whitelist(input);
    if !validation.is_valid {
        return Err(CliError::InvalidWhitelist(validation.message));
    }

    presenter.success("Whitelist is valid");
    presenter.output(&whitelist::to_input(&whitelist::normalize(input)));
    Ok(())
}

/// Handle save subcommand. Without `--whitelist` the stored list is kept.
pub async fn handle_save(
    panel: &Panel,
    whitelist: Option<String>,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    panel.load().await?;

    let input = match whitelist {
        Some(input) => input,
        None => panel.whitelist_input().await.unwrap_or_default(),
    };

    let report = save_with_spinner(panel, presenter, &input).await?;
    report_save(&report, presenter);
    Ok(())
}

pub(crate) async fn save_with_spinner(
    panel: &Panel,
    presenter: &mut Presenter,
    whitelist: &str,
) -> Result<SaveReport, CliError> {
    let save = panel.save();
    let report = with_spinner(presenter, save.slot(), "Saving settings...", save.save(whitelist)).await?;
    Ok(report)
}

pub(crate) fn report_save(report: &SaveReport, presenter: &Presenter) {
    let list = whitelist::to_input(&report.whitelist);
    if list.is_empty() {
        presenter.info("Whitelist: (empty)");
    } else {
        presenter.info(&format!("Whitelist: {list}"));
    }
    presenter.step("Proxy whitelist synced", &report.proxy_sync);
}

/// Handle settings subcommand
pub async fn handle_settings_command<S: SettingsStore>(
    action: SettingsAction,
    store: &S,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    match action {
        SettingsAction::Init => {
            store.init().await?;
            presenter.success(&format!(
                "Settings file created at: {}",
                store.path().display()
            ));
        }
        SettingsAction::Show => {
            let settings = load_settings(store).await?;
            let rows = [
                ("env_file", settings.env_file_or_default().display().to_string()),
                ("log_dir", settings.log_dir_or_default().display().to_string()),
                ("container_name", settings.container_name_or_default().to_string()),
                ("image", settings.image_or_default().to_string()),
                ("container_port", settings.container_port_or_default().to_string()),
                ("public_port", settings.public_port_or_default().to_string()),
                ("registry_url", settings.registry_url_or_default().to_string()),
                (
                    "tooling_releases_url",
                    settings.tooling_releases_url_or_default().to_string(),
                ),
                ("tooling", settings.tooling_or_default().to_string()),
                (
                    "proxy.config_path",
                    settings.proxy_config_or_default().display().to_string(),
                ),
                ("proxy.service", settings.proxy_service_or_default().to_string()),
                (
                    "proxy.origin_config_path",
                    settings.origin_config_or_default().display().to_string(),
                ),
                (
                    "proxy.management_service",
                    settings.management_service_or_default().to_string(),
                ),
            ];
            for (key, value) in rows {
                presenter.key_value(key, &value);
            }
        }
        SettingsAction::Path => presenter.output(&store.path().to_string_lossy()),
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), ConfigError> {
    if key == WHITELIST {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Edit the whitelist with 'poabot-panel save --whitelist <IPS>'".to_string(),
        });
    }
    if !KNOWN_KEYS.contains(&key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Unknown key. Run 'poabot-panel config keys' for the list".to_string(),
        });
    }
    Ok(())
}

fn display_value(key: &str, value: &ConfigValue, reveal: bool) -> String {
    let text = value.to_string();
    if text.is_empty() {
        NOT_SET.to_string()
    } else if is_secret_key(key) && !reveal {
        mask_secret(&text)
    } else {
        text
    }
}

/// Mask a secret for display (show first 4 and last 4 chars)
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{DOMAIN, PASSWORD};

    #[test]
    fn mask_secret_long() {
        assert_eq!(mask_secret("abcdefghijklmnop"), "abcd...mnop");
    }

    #[test]
    fn mask_secret_short() {
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn mask_secret_counts_chars_not_bytes() {
        assert_eq!(mask_secret("ééééé"), "*****");
        assert_eq!(mask_secret("éabcdefghé"), "éabc...fghé");
    }

    #[test]
    fn secrets_are_masked_unless_revealed() {
        let value = ConfigValue::from("supersecretvalue");
        assert_eq!(display_value("BINANCE_SECRET", &value, false), "supe...alue");
        assert_eq!(display_value("BINANCE_SECRET", &value, true), "supersecretvalue");
        assert_eq!(display_value("BINANCE_KEY", &value, false), "supersecretvalue");
    }

    #[test]
    fn empty_values_show_not_set() {
        assert_eq!(display_value(PASSWORD, &ConfigValue::from(""), true), NOT_SET);
    }

    #[test]
    fn lists_are_comma_joined() {
        let value = ConfigValue::from(vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()]);
        assert_eq!(display_value(WHITELIST, &value, false), "1.1.1.1, 2.2.2.2");
    }

    #[test]
    fn validate_known_keys() {
        assert!(validate_key(PASSWORD).is_ok());
        assert!(validate_key(DOMAIN).is_ok());
        assert!(validate_key("OKX_PASSPHRASE").is_ok());
    }

    #[test]
    fn validate_rejects_unknown_and_whitelist() {
        assert!(validate_key("unknown_key").is_err());
        let err = validate_key(WHITELIST).unwrap_err();
        assert!(err.to_string().contains("save --whitelist"));
    }
}
