//! PoaBot Panel - host administration for a containerized trading bot
//!
//! This crate edits the bot's env-file configuration, keeps the reverse proxy's IP
//! allow-list in sync with it, starts and updates the bot container, and binds the
//! proxy and management dashboard to a domain once its DNS points at this server.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Env-file codec, configuration store, whitelist rules, proxy config
//!   rewriting, version ordering and operation state
//! - **Application**: Orchestrators (save, lifecycle, domain link, test orders) and port traits
//! - **Infrastructure**: Adapter implementations (processes, files, Docker Hub, GitHub, TOML settings)
//! - **CLI**: Command-line interface, argument parsing, logging and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
