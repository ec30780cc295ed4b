//! Image registry and release metadata ports

use async_trait::async_trait;
use thiserror::Error;

/// Registry query errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Registry request failed: {0}")]
    RequestFailed(String),

    #[error("Registry returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to parse registry response: {0}")]
    ParseError(String),
}

/// Port for listing published tags of the bot image
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// All published tag names, in no particular order
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError>;
}

/// Release metadata errors
#[derive(Debug, Clone, Error)]
pub enum ReleaseError {
    #[error("Release request failed: {0}")]
    RequestFailed(String),

    #[error("Release API returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to parse release metadata: {0}")]
    ParseError(String),
}

/// A published release of the panel tooling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Tag name, usually `vMAJOR.MINOR.PATCH`
    pub tag: String,
    /// Installable package, if the release ships one
    pub package_url: Option<String>,
}

/// Port for listing releases of the companion management tooling
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError>;
}
