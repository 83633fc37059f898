//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::copy::copy_path;

/// A directory wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents); existing directories are left as is
    pub async fn create(&self) -> Result<(), DeployError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Names of the immediate subdirectories, in directory order
    pub async fn list_dir_names(&self) -> Result<Vec<String>, DeployError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        Ok(names)
    }

    /// Names of all immediate entries, dotfiles included
    pub async fn list_entry_names(&self) -> Result<Vec<String>, DeployError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }

    /// Remove every entry inside the directory, keeping the directory itself.
    ///
    /// Symlinks are unlinked, never followed.
    pub async fn clear(&self) -> Result<usize, DeployError> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path).await?;
            } else {
                fs::remove_file(&path).await?;
            }
            debug!("Removed {}", path.display());
            removed += 1;
        }

        Ok(removed)
    }

    /// Copy `src` (file or directory tree) into this directory under its own name
    pub async fn copy_in(&self, src: &Path) -> Result<PathBuf, DeployError> {
        let name = src.file_name().ok_or_else(|| {
            DeployError::ShellCommand(format!("copy {}: source has no file name", src.display()))
        })?;
        let target = self.path.join(name);
        copy_path(src, &target).await?;
        Ok(target)
    }
}
