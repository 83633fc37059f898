//! On-disk layout of a single archive

use std::path::{Path, PathBuf};

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// `strftime` pattern of archive directory names
pub const ARCHIVE_ID_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Provenance record: operator message plus the last commit line
pub const DEPLOY_INFO_FILE: &str = ".deploy_info";

/// Present only when the archive was invalidated; holds the reason
pub const INVALID_MARKER_FILE: &str = ".invalid";

/// Subdirectory holding the application configuration files
pub const CONF_DIR: &str = "conf";

/// Paths inside one archive directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    id: String,
    base_dir: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: &Path, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            base_dir: root.join(&id),
            id,
        }
    }

    /// Archive ID (the directory name)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    pub fn dir(&self) -> Dir {
        Dir::new(&self.base_dir)
    }

    pub fn conf_dir(&self) -> Dir {
        Dir::new(self.base_dir.join(CONF_DIR))
    }

    pub fn deploy_info_file(&self) -> File {
        File::new(self.base_dir.join(DEPLOY_INFO_FILE))
    }

    pub fn invalid_marker(&self) -> File {
        File::new(self.base_dir.join(INVALID_MARKER_FILE))
    }
}
