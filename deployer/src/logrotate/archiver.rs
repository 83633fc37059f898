//! Moves rotated log files into the archive directory

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::logrotate::settings::LogArchiveConfig;
use crate::utils::sha256_hash;

/// One line of the worklog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklogRecord {
    pub datetime: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    pub src: PathBuf,
    pub dst: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rotated-log archiver
pub struct LogArchiver {
    conf: LogArchiveConfig,
    matcher: Regex,
}

impl LogArchiver {
    pub fn new(conf: LogArchiveConfig) -> Result<Self, DeployError> {
        let pattern = format!(
            "^{}({})?",
            regex::escape(&conf.file_name),
            conf.rotation_pattern
        );
        let matcher = Regex::new(&pattern).map_err(|e| {
            DeployError::Config(format!("Invalid rotationPattern: {}", e))
        })?;
        Ok(Self { conf, matcher })
    }

    pub fn is_log_file(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Old enough, a regular file, and not the file currently written to
    pub async fn can_be_archived(&self, path: &Path, now: SystemTime) -> bool {
        let Ok(meta) = fs::metadata(path).await else {
            return false;
        };
        if !meta.is_file() {
            return false;
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(self.conf.file_name.as_str()) {
            return false;
        }
        let threshold = Duration::from_secs(self.conf.move_if_older_than_secs);
        meta.modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .map(|age| age > threshold)
            .unwrap_or(false)
    }

    /// Move one file and describe the outcome
    pub async fn archive(&self, path: &Path, now: SystemTime) -> WorklogRecord {
        let datetime = DateTime::<Local>::from(now)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let target = self.target_path(path).await;

        let mut record = WorklogRecord {
            datetime,
            checksum: None,
            src: path.to_path_buf(),
            dst: target.clone(),
            error: None,
        };

        match File::new(path).read_bytes().await {
            Ok(data) => record.checksum = Some(sha256_hash(&data)),
            Err(e) => {
                record.error = Some(e.to_string());
                return record;
            }
        }

        if let Err(e) = move_file(path, &target).await {
            warn!("Failed to archive {}: {}", path.display(), e);
            record.error = Some(e.to_string());
        }
        record
    }

    async fn target_path(&self, path: &Path) -> PathBuf {
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = match fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(mtime) => DateTime::<Local>::from(mtime).format("%Y%m%d%H%M").to_string(),
            Err(_) => "unknown".to_string(),
        };
        self.conf.dst_dir.join(format!("{}.{}", base, suffix))
    }

    pub async fn process_dir(&self) -> Result<Vec<WorklogRecord>, DeployError> {
        self.process_dir_at(SystemTime::now()).await
    }

    /// Archive every eligible log file, appending the results to the worklog
    pub async fn process_dir_at(&self, now: SystemTime) -> Result<Vec<WorklogRecord>, DeployError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.conf.src_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let mut records = Vec::new();
        for name in names {
            let abs_path = self.conf.src_dir.join(&name);
            if self.is_log_file(&name) && self.can_be_archived(&abs_path, now).await {
                debug!("Archiving {}", abs_path.display());
                records.push(self.archive(&abs_path, now).await);
            }
        }

        let lines = records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        File::new(&self.conf.worklog_path).append_lines(&lines).await?;

        info!("Archived {} log files", records.len());
        Ok(records)
    }
}

async fn move_file(src: &Path, dst: &Path) -> Result<(), DeployError> {
    if fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    fs::copy(src, dst).await?;
    fs::remove_file(src).await?;
    Ok(())
}
