//! Reverse proxy (Caddyfile) rule editing
//!
//! This is anchor-based substitution on a file we do not own, not a Caddyfile parser.
//! Each edit either finds its anchor and rewrites it, or reports
//! [`ProxyConfigUnrecognized`] and leaves the decision to the caller.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::error::ProxyConfigUnrecognized;

/// Addresses that must always reach the bot (TradingView alert senders and loopback)
pub const DEFAULT_ALLOWED_IPS: &[&str] = &[
    "52.89.214.238",
    "34.212.75.30",
    "54.218.53.128",
    "52.32.178.7",
    "127.0.0.1",
];

/// Name of the access-control matcher the whitelist lives in
pub const WHITELIST_MATCHER: &str = "@poa_whitelist";

static WHITELIST_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@poa_whitelist\s*\{\s*\n\s*remote_ip\s+(.*?)\s*\n").expect("valid clause regex")
});

static BARE_PORT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)(?:https?://)?(:\d+)([ \t]*\{[ \t]*)$").expect("valid port regex")
});

static SITE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([^\s@(#{}][^\s{]*)([ \t]*\{[ \t]*)$").expect("valid header regex")
});

/// Merge the always-allowed defaults with `ips`: defaults first, de-duplicated, blanks dropped
pub fn allowed_ips(ips: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let candidates = DEFAULT_ALLOWED_IPS
        .iter()
        .map(|s| s.to_string())
        .chain(ips.iter().map(|s| s.trim().to_string()));

    for ip in candidates {
        if !ip.is_empty() && !merged.contains(&ip) {
            merged.push(ip);
        }
    }
    merged
}

/// Replace the `remote_ip` list inside the whitelist matcher block.
///
/// Idempotent: applying the same list twice gives the same text.
pub fn update_whitelist_clause(
    config: &str,
    ips: &[String],
) -> Result<String, ProxyConfigUnrecognized> {
    if !WHITELIST_CLAUSE.is_match(config) {
        return Err(ProxyConfigUnrecognized {
            anchor: format!("{} block with a remote_ip directive", WHITELIST_MATCHER),
        });
    }

    let replacement = format!(
        "{} {{\n            remote_ip {}\n",
        WHITELIST_MATCHER,
        allowed_ips(ips).join(" ")
    );

    Ok(WHITELIST_CLAUSE
        .replacen(config, 1, regex::NoExpand(&replacement))
        .into_owned())
}

/// Bind the single top-level site block to `domain`.
///
/// A bare port binding such as `:80 {` has its port token replaced. Otherwise the first
/// top-level block header is replaced.
pub fn rebind_host(config: &str, domain: &str) -> Result<String, ProxyConfigUnrecognized> {
    if BARE_PORT_HEADER.is_match(config) {
        let rewritten = BARE_PORT_HEADER.replacen(config, 1, |caps: &Captures| {
            format!("{}{}{}", &caps[1], domain, &caps[3])
        });
        return Ok(rewritten.into_owned());
    }

    if SITE_HEADER.is_match(config) {
        let rewritten = SITE_HEADER.replacen(config, 1, |caps: &Captures| {
            format!("{}{}", domain, &caps[2])
        });
        return Ok(rewritten.into_owned());
    }

    Err(ProxyConfigUnrecognized {
        anchor: "a top-level site block header".to_string(),
    })
}

/// Full site block for a fresh install: dashboard proxy, whitelisted bot, 403 for the rest
pub fn render_default(domain: &str, bot_port: u16, management_port: u16) -> String {
    format!(
        r#"{domain} {{
    redir /dashboard /dashboard/
    handle /dashboard/* {{
        reverse_proxy localhost:{management_port} {{
            transport http {{
                tls_insecure_skip_verify
            }}
        }}
    }}

    handle {{
        {matcher} {{
            remote_ip {ips}
        }}
        handle {matcher} {{
            reverse_proxy {matcher} 127.0.0.1:{bot_port}
        }}
        handle {{
            respond 403
        }}
    }}
}}
"#,
        matcher = WHITELIST_MATCHER,
        ips = DEFAULT_ALLOWED_IPS.join(" "),
    )
}
