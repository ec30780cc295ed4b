//! Privileged file access port

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// File access errors
#[derive(Debug, Clone, Error)]
pub enum FileError {
    #[error("Permission denied: {0} (run poabot-panel as root to manage this file)")]
    PermissionDenied(String),

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },
}

/// Port for reading and replacing files at privileged paths
#[async_trait]
pub trait PrivilegedFs: Send + Sync {
    /// Read a whole file.
    ///
    /// # Returns
    /// Ok(None) when the file does not exist
    async fn read(&self, path: &Path) -> Result<Option<String>, FileError>;

    /// Replace a file's content.
    ///
    /// Readers see either the old content or the new content, never a partial write.
    async fn replace(&self, path: &Path, content: &str) -> Result<(), FileError>;
}
