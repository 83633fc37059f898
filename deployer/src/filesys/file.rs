//! File operations

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::DeployError;

/// A file wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, DeployError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Read file contents as bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, DeployError> {
        Ok(fs::read(&self.path).await?)
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, DeployError> {
        let contents = self.read_string().await?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Write string to file, replacing any previous contents
    pub async fn write_string(&self, contents: &str) -> Result<(), DeployError> {
        let mut file = fs::File::create(&self.path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Append lines to the file, creating it when absent
    pub async fn append_lines(&self, lines: &[String]) -> Result<(), DeployError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        for line in lines {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        file.sync_all().await?;
        Ok(())
    }
}
