//! Env file codec
//!
//! The bot reads its settings from a line-oriented `KEY="VALUE"` file. Parsing is lenient:
//! blank lines, `#` comments and lines without a usable `KEY=` prefix are dropped.

use thiserror::Error;

/// A value that cannot be written as a single env line
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value for {key} contains a line break or control character")]
pub struct UnsafeValue {
    pub key: String,
}

/// Ordered key-value mapping.
///
/// Re-inserting an existing key replaces the value but keeps the key's original position,
/// so a file with duplicate keys resolves to last-wins without reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    entries: Vec<(String, String)>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Parse env file content into an ordered mapping
pub fn parse(content: &str) -> EnvMap {
    let mut map = EnvMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        map.insert(key, strip_quotes(value.trim()));
    }

    map
}

/// Serialize a mapping into env file content, one `KEY="VALUE"` line per entry.
///
/// Control characters would split a value across lines and let it inject other keys,
/// so any key or value carrying one is refused and nothing is produced.
pub fn serialize(map: &EnvMap) -> Result<String, UnsafeValue> {
    let mut out = String::new();
    for (key, value) in map.iter() {
        if key.chars().chain(value.chars()).any(char::is_control) {
            return Err(UnsafeValue {
                key: key.to_string(),
            });
        }
        out.push_str(key);
        out.push('=');
        if is_wrapped(value, '"') {
            out.push_str(value);
        } else {
            out.push('"');
            out.push_str(value);
            out.push('"');
        }
        out.push('\n');
    }
    Ok(out)
}

fn strip_quotes(value: &str) -> &str {
    if is_wrapped(value, '"') || is_wrapped(value, '\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn is_wrapped(value: &str, quote: char) -> bool {
    value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote)
}
