//! Utility functions

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version information for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("KDEPLOY_GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("KDEPLOY_BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Lowercase hex SHA-256 digest of `data`
pub fn sha256_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Width of an operator step banner, borders included
const BANNER_WIDTH: usize = 70;

/// Render the boxed banner printed before every deployment step
pub fn step_banner(text: &str) -> String {
    let rule = "-".repeat(BANNER_WIDTH);
    let padding = " ".repeat((BANNER_WIDTH - 3).saturating_sub(text.chars().count()));
    format!("\n\n{rule}\n| {text}{padding}|\n{rule}")
}
