//! Error types for the deployment manager

use thiserror::Error;

/// Main error type for kdeploy
#[derive(Error, Debug)]
pub enum DeployError {
    /// Invalid, unsafe or unreadable configuration
    #[error("{0}")]
    Config(String),

    /// A required configuration key is absent
    #[error("missing required configuration key '{0}'")]
    MissingKey(String),

    /// An external step exited with a nonzero status
    #[error("Failed to process action: {0}")]
    ShellCommand(String),

    /// Operator supplied an ambiguous or unresolvable identifier
    #[error("{0}")]
    Input(String),

    #[error("Archive {archive_id} has been invalidated: {reason}")]
    InvalidatedArchive { archive_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::Config(_) | DeployError::MissingKey(_) => 2,
            DeployError::Input(_) => 3,
            DeployError::InvalidatedArchive { .. } => 4,
            DeployError::ShellCommand(_) => 5,
            _ => 1,
        }
    }

    /// Whether the error belongs to the configuration class
    pub fn is_config(&self) -> bool {
        matches!(self, DeployError::Config(_) | DeployError::MissingKey(_))
    }
}
