//! Source synchronization through the git client

use tracing::{debug, info};

use crate::config::DeploymentConfig;
use crate::deploy::runner::{CommandRunner, CommandSpec};
use crate::errors::DeployError;

/// Bring the working directory to the latest state of the configured branch.
///
/// A working directory without `.git` gets a fresh clone; otherwise the
/// branch is checked out, the remote fetched and `<remote>/<branch>` merged.
pub async fn sync_repository(
    runner: &dyn CommandRunner,
    conf: &DeploymentConfig,
) -> Result<(), DeployError> {
    let working_dir = conf.working_dir();

    if !working_dir.join(".git").is_dir() {
        info!("Cloning {} into {}", conf.git_url(), working_dir.display());
        runner
            .run(CommandSpec::new("git", ["clone", conf.git_url(), "."], working_dir))
            .await?;
        return Ok(());
    }

    debug!("Working copy exists, updating from {}", conf.git_remote());
    runner
        .run(CommandSpec::new("git", ["checkout", conf.git_branch()], working_dir))
        .await?;
    runner
        .run(CommandSpec::new("git", ["fetch", conf.git_remote()], working_dir))
        .await?;
    let upstream = format!("{}/{}", conf.git_remote(), conf.git_branch());
    runner
        .run(CommandSpec::new("git", ["merge", upstream.as_str()], working_dir))
        .await?;

    info!("Working copy at latest {}", upstream);
    Ok(())
}

/// One-line description of the commit checked out in the working directory
pub async fn latest_commit(
    runner: &dyn CommandRunner,
    conf: &DeploymentConfig,
) -> Result<String, DeployError> {
    let output = runner
        .run(CommandSpec::new("git", ["log", "-1", "--oneline"], conf.working_dir()).capture())
        .await?;
    Ok(output.stdout.trim().to_string())
}
