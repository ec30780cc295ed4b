//! IP allow-list parsing and validation

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+").expect("valid separator regex"));

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("valid ipv4 regex")
});

/// Outcome of validating free-text allow-list input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistValidation {
    pub is_valid: bool,
    /// Failing tokens in input order
    pub invalid_ips: Vec<String>,
    /// Empty when valid
    pub message: String,
}

impl WhitelistValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            invalid_ips: Vec::new(),
            message: String::new(),
        }
    }
}

/// Whether `token` is a strict dotted-quad IPv4 address
pub fn is_ipv4(token: &str) -> bool {
    IPV4.is_match(token)
}

/// Split free text on commas, semicolons and whitespace, dropping empty tokens
pub fn tokenize(input: &str) -> Vec<String> {
    SEPARATOR
        .split(input)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate allow-list input. Empty input is valid.
pub fn validate(input: &str) -> WhitelistValidation {
    let invalid_ips: Vec<String> = tokenize(input)
        .into_iter()
        .filter(|ip| !is_ipv4(ip))
        .collect();

    if invalid_ips.is_empty() {
        return WhitelistValidation::valid();
    }

    WhitelistValidation {
        is_valid: false,
        message: format!("Invalid IP addresses: {}", invalid_ips.join(", ")),
        invalid_ips,
    }
}

/// Normalize input into the list that gets persisted.
///
/// Blank input becomes `[""]` so the key keeps a value on disk.
pub fn normalize(input: &str) -> Vec<String> {
    let list = tokenize(input);
    if list.is_empty() {
        vec![String::new()]
    } else {
        list
    }
}

/// Order-insensitive comparison of two allow-lists
pub fn same_entries(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Render a stored list back into editable text
pub fn to_input(list: &[String]) -> String {
    list.join(", ")
}
