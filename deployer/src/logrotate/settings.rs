//! Log archiver configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::filesys::file::File;

/// Configuration of the rotated-log archiver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogArchiveConfig {
    /// Directory the application writes its logs into
    pub src_dir: PathBuf,

    /// Directory receiving archived logs
    pub dst_dir: PathBuf,

    /// Name of the active log file
    pub file_name: String,

    /// Regex for the suffix rotated copies carry, e.g. `.(\d+)`
    pub rotation_pattern: String,

    pub move_if_older_than_secs: u64,

    /// File receiving one JSON record per processed log
    pub worklog_path: PathBuf,
}

impl LogArchiveConfig {
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        File::new(path).read_json().await.map_err(|e| {
            DeployError::Config(format!("Cannot load {}: {}", path.display(), e))
        })
    }

    /// Both the worklog's directory and the destination must already exist
    pub fn validate(&self) -> Result<(), DeployError> {
        let worklog_dir = self
            .worklog_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !worklog_dir.is_dir() {
            return Err(DeployError::Config(format!(
                "Worklog directory {} does not exist.",
                worklog_dir.display()
            )));
        }
        if !self.dst_dir.is_dir() {
            return Err(DeployError::Config(format!(
                "Destination directory {} does not exist",
                self.dst_dir.display()
            )));
        }
        Ok(())
    }
}
