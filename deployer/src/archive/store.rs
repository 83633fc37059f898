//! Timestamp-addressed archive directories

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::archive::layout::{ArchiveLayout, ARCHIVE_ID_FORMAT};
use crate::errors::DeployError;
use crate::filesys::dir::Dir;

/// Format an instant as an archive ID (`YYYY-MM-DD-HH-MM-SS`)
pub fn archive_id_for(timestamp: &NaiveDateTime) -> String {
    timestamp.format(ARCHIVE_ID_FORMAT).to_string()
}

/// The set of archives below the archive root
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: Dir,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Dir::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Layout of an archive, whether or not it exists yet
    pub fn layout(&self, archive_id: &str) -> ArchiveLayout {
        ArchiveLayout::new(self.root.path(), archive_id)
    }

    /// Create the archive for `timestamp` together with its `conf/` directory.
    ///
    /// Reusing a timestamp returns the existing archive untouched.
    pub async fn create(&self, timestamp: &NaiveDateTime) -> Result<ArchiveLayout, DeployError> {
        let layout = self.layout(&archive_id_for(timestamp));
        if layout.dir().exists().await {
            warn!("Archive {} already exists, reusing it", layout.id());
        }
        layout.conf_dir().create().await?;
        info!("Created archive {}", layout.path().display());
        Ok(layout)
    }

    /// IDs of all archives, in directory order
    pub async fn list(&self) -> Result<Vec<String>, DeployError> {
        self.root.list_dir_names().await
    }

    /// Find the single archive whose ID starts with `prefix`
    pub async fn resolve(&self, prefix: &str) -> Result<Option<String>, DeployError> {
        let mut found: Option<String> = None;
        for id in self.list().await? {
            if !id.starts_with(prefix) {
                continue;
            }
            if found.is_some() {
                return Err(DeployError::Input(
                    "Ambiguous archive ID search. Please specify a more concrete value."
                        .to_string(),
                ));
            }
            found = Some(id);
        }
        debug!("Archive prefix {:?} resolved to {:?}", prefix, found);
        Ok(found)
    }

    /// Mark an archive as unfit for deployment
    pub async fn invalidate(&self, archive_id: &str, reason: &str) -> Result<(), DeployError> {
        let layout = self.layout(archive_id);
        if !layout.dir().exists().await {
            return Err(DeployError::Input(format!(
                "Archive {} does not exist",
                archive_id
            )));
        }
        layout.invalid_marker().write_string(reason).await?;
        info!("Archive {} invalidated: {}", archive_id, reason);
        Ok(())
    }

    /// Recorded invalidation reason, if the archive carries a marker
    pub async fn invalidation_reason(&self, archive_id: &str) -> Result<Option<String>, DeployError> {
        let marker = self.layout(archive_id).invalid_marker();
        if marker.exists().await {
            Ok(Some(marker.read_string().await?))
        } else {
            Ok(None)
        }
    }

    /// Fail with [`DeployError::InvalidatedArchive`] when the archive is marked
    pub async fn check_valid(&self, archive_id: &str) -> Result<(), DeployError> {
        match self.invalidation_reason(archive_id).await? {
            Some(reason) => Err(DeployError::InvalidatedArchive {
                archive_id: archive_id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
