//! Configuration store
//!
//! Holds the canonical in-memory bot configuration. All mutation goes through
//! [`ConfigStore::load`], [`ConfigStore::update`] and [`ConfigStore::reset`].

use tracing::warn;

use super::bot_config::{ConfigValue, Configuration, WHITELIST};

/// Result of a single-key update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    /// The value was stored
    Applied,
    /// The value was refused and the previous state kept
    Rejected(String),
    /// Nothing is loaded yet, so there is nothing to update
    NotLoaded,
}

/// Canonical configuration state: `{config, loading, error}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    config: Option<Configuration>,
    loading: bool,
    error: Option<String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create an unloaded store
    pub fn new() -> Self {
        Self {
            config: None,
            loading: true,
            error: None,
        }
    }

    pub fn config(&self) -> Option<&Configuration> {
        self.config.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the state with a normalized copy of `raw`.
    ///
    /// A `WHITELIST` given as text is decoded from JSON; anything that is not a JSON
    /// array of strings becomes an empty list. Decode failures are logged, not stored.
    pub fn load(&mut self, raw: Configuration) {
        let whitelist = match raw.get(WHITELIST) {
            Some(ConfigValue::List(items)) => items.clone(),
            Some(ConfigValue::Text(text)) => decode_whitelist(text).unwrap_or_else(|e| {
                warn!(error = %e, "WHITELIST is not a JSON list, using an empty list");
                Vec::new()
            }),
            None => Vec::new(),
        };

        self.config = Some(raw.with_whitelist(whitelist));
        self.loading = false;
        self.error = None;
    }

    /// Record that the configuration could not be read
    pub fn fail(&mut self, message: impl Into<String>) {
        self.config = None;
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Set a single key.
    ///
    /// `WHITELIST` expects a JSON list and keeps the previous value when the input does
    /// not decode. Every other key is stored verbatim.
    pub fn update(&mut self, key: &str, value: &str) -> StoreUpdate {
        let Some(config) = self.config.as_mut() else {
            return StoreUpdate::NotLoaded;
        };

        if key == WHITELIST {
            return match decode_whitelist(value) {
                Ok(items) => {
                    config.set(WHITELIST, items);
                    StoreUpdate::Applied
                }
                Err(e) => {
                    warn!(error = %e, "Rejected WHITELIST update");
                    StoreUpdate::Rejected(e.to_string())
                }
            };
        }

        config.set(key, value);
        StoreUpdate::Applied
    }

    /// Back to the initial unloaded state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn decode_whitelist(text: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(text)
}
