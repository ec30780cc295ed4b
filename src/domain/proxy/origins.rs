//! Management service origin allow-list (cockpit.conf `Origins =` line)

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::error::ProxyConfigUnrecognized;

static ORIGINS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)Origins[ \t]*=.*$").expect("valid origins regex"));

/// HTTPS and WSS origins for a domain
pub fn origins_for(domain: &str) -> String {
    format!("https://{domain} wss://{domain}")
}

/// Point the `Origins` directive at `domain`
pub fn rewrite_origins(config: &str, domain: &str) -> Result<String, ProxyConfigUnrecognized> {
    if !ORIGINS_LINE.is_match(config) {
        return Err(ProxyConfigUnrecognized {
            anchor: "an Origins directive".to_string(),
        });
    }

    let origins = origins_for(domain);
    Ok(ORIGINS_LINE
        .replacen(config, 1, |caps: &Captures| {
            format!("{}Origins = {}", &caps[1], origins)
        })
        .into_owned())
}

/// Web service section for a fresh install behind the reverse proxy
pub fn render_default(domain: &str) -> String {
    format!(
        "[WebService]\nOrigins = {}\nProtocolHeader = X-Forwarded-Proto\nUrlRoot = /dashboard\n",
        origins_for(domain)
    )
}
