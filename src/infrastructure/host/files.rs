//! Local file adapter with atomic replace

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;

use crate::application::ports::{FileError, PrivilegedFs};

/// Files on the local host, accessed with the panel's own privileges.
///
/// Unlike [`ProcessRunner`](super::ProcessRunner) this never elevates through sudo. The managed
/// paths (`/root/poabot.env`, the proxy config, the dashboard origin file) are root-owned, so
/// the panel has to run as root; otherwise every read or write surfaces
/// [`FileError::PermissionDenied`] naming that requirement.
#[derive(Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// Write a sibling temp file and rename it over `path`, keeping the old permissions
    fn replace_blocking(path: &Path, content: &str) -> Result<(), FileError> {
        let write_err = |e: std::io::Error| map_write_error(path, e);

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
        }

        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

fn map_write_error(path: &Path, e: std::io::Error) -> FileError {
    if e.kind() == ErrorKind::PermissionDenied {
        FileError::PermissionDenied(path.display().to_string())
    } else {
        FileError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl PrivilegedFs for LocalFs {
    async fn read(&self, path: &Path) -> Result<Option<String>, FileError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(FileError::PermissionDenied(path.display().to_string()))
            }
            Err(e) => Err(FileError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn replace(&self, path: &Path, content: &str) -> Result<(), FileError> {
        let path = path.to_path_buf();
        let content = content.to_string();
        let target = path.clone();

        tokio::task::spawn_blocking(move || Self::replace_blocking(&path, &content))
            .await
            .map_err(|e| FileError::WriteFailed {
                path: target.display().to_string(),
                message: e.to_string(),
            })?
    }
}
