//! Safety checks for configured directories

use std::path::{Component, Path, PathBuf};

use crate::errors::DeployError;

/// Number of named components below the filesystem root
fn depth_below_root(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

/// Whether a canonical path is the root itself or one of its direct children
pub fn is_forbidden(canonical: &Path) -> bool {
    depth_below_root(canonical) <= 1
}

/// Validate a configured directory and return its canonical form.
///
/// The input must be absolute, must resolve to an existing directory and its
/// resolved form must lie at least two levels below the root. `key` names the
/// configuration entry in error messages.
pub fn validate_dir(key: &str, raw: &str) -> Result<PathBuf, DeployError> {
    let input = Path::new(raw);
    if !input.is_absolute() {
        return Err(DeployError::Config(format!("{} path must be absolute", key)));
    }

    let canonical = std::fs::canonicalize(input).map_err(|_| {
        DeployError::Config(format!("Path {} ({}) does not exist.", raw, key))
    })?;

    if is_forbidden(&canonical) {
        return Err(DeployError::Config(format!(
            "{} cannot be set to forbidden value {}",
            key,
            canonical.display()
        )));
    }

    if !canonical.is_dir() {
        return Err(DeployError::Config(format!(
            "Path {} ({}) is not a directory.",
            canonical.display(),
            key
        )));
    }

    Ok(canonical)
}
