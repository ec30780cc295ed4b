//! Edits to externally-owned reverse proxy and management service config files

pub mod caddyfile;
pub mod origins;

pub use caddyfile::{allowed_ips, rebind_host, update_whitelist_clause, DEFAULT_ALLOWED_IPS};
pub use origins::rewrite_origins;
