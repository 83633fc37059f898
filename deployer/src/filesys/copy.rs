//! Recursive copy with `cp -r -p` semantics

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::DeployError;

fn copy_failure(src: &Path, dst: &Path, err: std::io::Error) -> DeployError {
    DeployError::ShellCommand(format!(
        "copy {} -> {}: {}",
        src.display(),
        dst.display(),
        err
    ))
}

/// Copy `src` to `dst`.
///
/// Directories are merged into an existing `dst`, regular files overwrite,
/// symlinks are recreated rather than dereferenced, and permission bits are
/// carried over. A missing `src` fails the copy.
pub async fn copy_path(src: &Path, dst: &Path) -> Result<(), DeployError> {
    let meta = fs::symlink_metadata(src)
        .await
        .map_err(|e| copy_failure(src, dst, e))?;

    let mut pending: Vec<(PathBuf, PathBuf, Metadata)> =
        vec![(src.to_path_buf(), dst.to_path_buf(), meta)];
    // directory permissions are applied once the tree is filled
    let mut dir_perms = Vec::new();

    while let Some((from, to, meta)) = pending.pop() {
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            copy_symlink(&from, &to).await?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&to)
                .await
                .map_err(|e| copy_failure(&from, &to, e))?;
            let mut entries = fs::read_dir(&from)
                .await
                .map_err(|e| copy_failure(&from, &to, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| copy_failure(&from, &to, e))?
            {
                let child_meta = fs::symlink_metadata(entry.path())
                    .await
                    .map_err(|e| copy_failure(&entry.path(), &to, e))?;
                pending.push((entry.path(), to.join(entry.file_name()), child_meta));
            }
            dir_perms.push((to, meta.permissions()));
        } else {
            fs::copy(&from, &to)
                .await
                .map_err(|e| copy_failure(&from, &to, e))?;
        }
    }

    for (path, perms) in dir_perms.into_iter().rev() {
        fs::set_permissions(&path, perms)
            .await
            .map_err(|e| copy_failure(src, &path, e))?;
    }

    Ok(())
}

#[cfg(unix)]
async fn copy_symlink(from: &Path, to: &Path) -> Result<(), DeployError> {
    let target = fs::read_link(from)
        .await
        .map_err(|e| copy_failure(from, to, e))?;
    if fs::symlink_metadata(to).await.is_ok() {
        fs::remove_file(to)
            .await
            .map_err(|e| copy_failure(from, to, e))?;
    }
    fs::symlink(&target, to)
        .await
        .map_err(|e| copy_failure(from, to, e))
}

#[cfg(not(unix))]
async fn copy_symlink(from: &Path, to: &Path) -> Result<(), DeployError> {
    fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| copy_failure(from, to, e))
}
