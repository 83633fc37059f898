//! Production build of the working copy

use tracing::info;

use crate::config::DeploymentConfig;
use crate::deploy::runner::{CommandRunner, CommandSpec};
use crate::errors::DeployError;

/// Install dependencies when missing, then run the production build
pub async fn build_project(
    runner: &dyn CommandRunner,
    conf: &DeploymentConfig,
) -> Result<(), DeployError> {
    let build = conf.build();
    let working_dir = conf.working_dir();

    if !working_dir.join(&build.dependency_marker).is_dir() {
        let install = CommandSpec::from_argv(&build.install_command, working_dir)?;
        info!("Installing dependencies: {}", install.display());
        runner.run(install).await?;
    }

    let build_cmd = CommandSpec::from_argv(&build.build_command, working_dir)?;
    info!("Running build: {}", build_cmd.display());
    runner.run(build_cmd).await?;
    Ok(())
}
