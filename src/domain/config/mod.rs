//! Configuration: the bot's env-file settings and the panel's own settings

pub mod bot_config;
pub mod panel_settings;
pub mod store;

pub use bot_config::{
    is_secret_key, sanitize_field, sanitize_password, ConfigValue, Configuration, DISCORD_WEBHOOK_URL,
    DOMAIN, KNOWN_KEYS, PASSWORD, WHITELIST,
};
pub use panel_settings::{PanelSettings, ProxySettings};
pub use store::{ConfigStore, StoreUpdate};
