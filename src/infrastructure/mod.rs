//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the host (processes, files), Docker Hub and GitHub.

pub mod config;
pub mod host;
pub mod registry;
pub mod releases;

// Re-export adapters
pub use config::TomlSettingsStore;
pub use host::{LocalFs, Privilege, ProcessRunner};
pub use registry::DockerHubRegistry;
pub use releases::GithubReleases;
