//! Bot configuration value object

use std::fmt;

use crate::domain::env_file::EnvMap;

/// Key holding the IP allow-list
pub const WHITELIST: &str = "WHITELIST";
/// Key holding the public domain
pub const DOMAIN: &str = "DOMAIN";
/// Key holding the webhook password
pub const PASSWORD: &str = "PASSWORD";
/// Key holding the Discord webhook URL
pub const DISCORD_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";

/// Keys the panel knows how to edit. Unknown keys found on disk pass through untouched.
pub const KNOWN_KEYS: &[&str] = &[
    PASSWORD,
    DISCORD_WEBHOOK_URL,
    "UPBIT_KEY",
    "UPBIT_SECRET",
    "BITHUMB_KEY",
    "BITHUMB_SECRET",
    "BINANCE_KEY",
    "BINANCE_SECRET",
    "BYBIT_KEY",
    "BYBIT_SECRET",
    "OKX_KEY",
    "OKX_SECRET",
    "OKX_PASSPHRASE",
    "BITGET_KEY",
    "BITGET_SECRET",
    "BITGET_PASSPHRASE",
    "KIS1_KEY",
    "KIS1_SECRET",
    "KIS1_ACCOUNT_NUMBER",
    "KIS1_ACCOUNT_CODE",
    "KIS2_KEY",
    "KIS2_SECRET",
    "KIS2_ACCOUNT_NUMBER",
    "KIS2_ACCOUNT_CODE",
    "KIS3_KEY",
    "KIS3_SECRET",
    "KIS3_ACCOUNT_NUMBER",
    "KIS3_ACCOUNT_CODE",
    "KIS4_KEY",
    "KIS4_SECRET",
    "KIS4_ACCOUNT_NUMBER",
    "KIS4_ACCOUNT_CODE",
    WHITELIST,
    DOMAIN,
];

/// Characters accepted in the webhook password besides ASCII letters and digits
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Whether a key holds a credential that should be masked on display
pub fn is_secret_key(key: &str) -> bool {
    key == PASSWORD || key.ends_with("_SECRET") || key.ends_with("_PASSPHRASE")
}

/// Drop characters the bot does not accept in its password (spaces, non-ASCII, ...)
pub fn sanitize_password(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(*c))
        .collect()
}

/// Clean up operator input for a field: trimmed, control characters removed,
/// and filtered for the password
pub fn sanitize_field(key: &str, input: &str) -> String {
    if key == PASSWORD {
        sanitize_password(input)
    } else {
        input.trim().chars().filter(|c| !c.is_control()).collect()
    }
}

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Ordered mapping of bot settings.
///
/// Also used as the "raw" shape handed to the store before normalization, where
/// `WHITELIST` may still be a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: Vec<(String, ConfigValue)>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a raw configuration from parsed env file entries
    pub fn from_env(map: &EnvMap) -> Self {
        map.iter()
            .map(|(k, v)| (k.to_string(), ConfigValue::Text(v.to_string())))
            .collect()
    }

    /// Materialize for the env file, JSON-encoding list values
    pub fn to_env(&self) -> EnvMap {
        self.entries
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    ConfigValue::Text(s) => s.clone(),
                    ConfigValue::List(items) => encode_list(items),
                };
                (k.clone(), value)
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text value of a key, empty when absent or not text
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(ConfigValue::as_text).unwrap_or("")
    }

    /// The allow-list, empty when absent
    pub fn whitelist(&self) -> &[String] {
        self.get(WHITELIST)
            .and_then(ConfigValue::as_list)
            .unwrap_or(&[])
    }

    /// Trimmed DOMAIN value
    pub fn domain(&self) -> &str {
        self.text(DOMAIN).trim()
    }

    /// Insert or overwrite, keeping the key's original position
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Copy with the allow-list replaced
    pub fn with_whitelist(&self, whitelist: Vec<String>) -> Self {
        let mut next = self.clone();
        next.set(WHITELIST, whitelist);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (k, v) in iter {
            config.set(k, v);
        }
        config
    }
}

/// Encode a list the way the env file stores it
pub fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
