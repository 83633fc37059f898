//! Release orchestration: forward deployments and rollbacks

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::archive::layout::{CONF_DIR, DEPLOY_INFO_FILE};
use crate::archive::{ArchiveLayout, ArchiveStore};
use crate::config::settings::MAIN_CONF_FILE;
use crate::config::DeploymentConfig;
use crate::deploy::fsm::{ReleaseEvent, ReleaseFsm, ReleasePath, ReleaseState};
use crate::deploy::runner::CommandRunner;
use crate::deploy::{builder, git};
use crate::errors::DeployError;
use crate::filesys::copy::copy_path;
use crate::filesys::dir::Dir;
use crate::utils::step_banner;

/// Outcome of a successful deployment attempt
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub path: ReleasePath,
    pub archive_id: String,

    /// Contents of the archive's provenance record
    pub provenance: String,
}

/// Drives a deployment attempt step by step
pub struct ReleaseOrchestrator {
    conf: DeploymentConfig,
    store: ArchiveStore,
    runner: Arc<dyn CommandRunner>,
    fsm: RwLock<ReleaseFsm>,
}

impl ReleaseOrchestrator {
    pub fn new(conf: DeploymentConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let store = ArchiveStore::new(conf.archive_dir());
        Self {
            conf,
            store,
            runner,
            fsm: RwLock::new(ReleaseFsm::new(ReleasePath::Forward)),
        }
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// State of the current (or last) attempt
    pub async fn state(&self) -> ReleaseState {
        self.fsm.read().await.state()
    }

    /// Snapshot of the current (or last) attempt
    pub async fn attempt(&self) -> ReleaseFsm {
        self.fsm.read().await.clone()
    }

    async fn begin(&self, path: ReleasePath) -> Result<(), DeployError> {
        let mut fsm = self.fsm.write().await;
        *fsm = ReleaseFsm::new(path);
        fsm.process(ReleaseEvent::Start)
            .map_err(DeployError::Internal)
    }

    /// Print the step banner, run the step and record its outcome
    async fn step<T>(
        &self,
        state: ReleaseState,
        action: impl Future<Output = Result<T, DeployError>>,
    ) -> Result<T, DeployError> {
        {
            let fsm = self.fsm.read().await;
            if fsm.state() != state {
                return Err(DeployError::Internal(format!(
                    "step {:?} attempted while in {:?}",
                    state,
                    fsm.state()
                )));
            }
        }

        println!("{}", step_banner(state.description()));
        info!(step = ?state, "{}", state.description());

        match action.await {
            Ok(value) => {
                let mut fsm = self.fsm.write().await;
                fsm.process(ReleaseEvent::StepSucceeded)
                    .map_err(DeployError::Internal)?;
                if fsm.state() == ReleaseState::Done {
                    info!("Deployment finished");
                }
                Ok(value)
            }
            Err(e) => {
                error!(step = ?state, "Step failed: {}", e);
                let mut fsm = self.fsm.write().await;
                if let Err(transition) = fsm.process(ReleaseEvent::StepFailed(e.to_string())) {
                    error!("{}", transition);
                }
                Err(e)
            }
        }
    }

    /// Build a new archive from the latest source and make it live
    pub async fn deploy_new(
        &self,
        timestamp: &NaiveDateTime,
        message: Option<&str>,
    ) -> Result<ReleaseReport, DeployError> {
        info!("Installing latest version from {}", self.conf.git_branch());
        self.begin(ReleasePath::Forward).await?;

        self.step(ReleaseState::SyncingSource, self.update_from_repository())
            .await?;
        self.step(ReleaseState::RefreshingWorkingConfig, self.update_working_conf())
            .await?;
        self.step(ReleaseState::Building, self.build_project())
            .await?;
        let archive = self
            .step(ReleaseState::Archiving, self.create_archive(timestamp))
            .await?;
        self.step(ReleaseState::CopyingConfigIntoArchive, self.copy_configuration(&archive))
            .await?;
        let provenance = self
            .step(
                ReleaseState::RecordingProvenance,
                self.record_deployment_info(&archive, message),
            )
            .await?;
        self.step(ReleaseState::CopyingAppIntoArchive, self.copy_app_to_archive(&archive))
            .await?;
        self.step(ReleaseState::ClearingLiveDir, self.remove_current_deployment())
            .await?;
        self.step(ReleaseState::InstallingFromArchive, self.deploy_new_version(&archive))
            .await?;

        Ok(ReleaseReport {
            path: ReleasePath::Forward,
            archive_id: archive.id().to_string(),
            provenance,
        })
    }

    /// Reinstall the archive identified by `archive_id` (a full ID or a unique prefix)
    pub async fn deploy_archive(&self, archive_id: &str) -> Result<ReleaseReport, DeployError> {
        self.begin(ReleasePath::Rollback).await?;

        let archive = self
            .step(ReleaseState::ResolvingArchive, self.resolve_archive(archive_id))
            .await?;
        info!("Installing from archive: {}", archive.id());
        self.step(ReleaseState::CheckingValidity, self.verify_archive(&archive))
            .await?;
        self.step(ReleaseState::ClearingLiveDir, self.remove_current_deployment())
            .await?;
        self.step(ReleaseState::InstallingFromArchive, self.deploy_new_version(&archive))
            .await?;

        let provenance = archive.deploy_info_file().read_string().await?;
        println!("\nDeployment information:\n{}", provenance);

        Ok(ReleaseReport {
            path: ReleasePath::Rollback,
            archive_id: archive.id().to_string(),
            provenance,
        })
    }

    async fn resolve_archive(&self, archive_id: &str) -> Result<ArchiveLayout, DeployError> {
        match self.store.resolve(archive_id).await? {
            Some(id) => Ok(self.store.layout(&id)),
            None => Err(DeployError::Input(format!(
                "No matching archive for {}",
                archive_id
            ))),
        }
    }

    /// Refuse archives that are invalidated or lack part of their payload
    pub async fn verify_archive(&self, archive: &ArchiveLayout) -> Result<(), DeployError> {
        self.store.check_valid(archive.id()).await?;
        let missing: Vec<&str> = self
            .payload()
            .filter(|item| !archive.path().join(item).exists())
            .collect();
        if !missing.is_empty() {
            return Err(DeployError::Input(format!(
                "Archive {} is incomplete, missing: {}",
                archive.id(),
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Entries an archive carries into the live directory
    fn payload(&self) -> impl Iterator<Item = &str> {
        self.conf
            .build()
            .outputs
            .iter()
            .map(String::as_str)
            .chain([DEPLOY_INFO_FILE, CONF_DIR])
    }

    pub async fn update_from_repository(&self) -> Result<(), DeployError> {
        git::sync_repository(self.runner.as_ref(), &self.conf).await
    }

    /// Copy the current `config.xml` into the working copy's `conf` directory
    pub async fn update_working_conf(&self) -> Result<(), DeployError> {
        let src = self
            .conf
            .app_config_dir()
            .join(self.conf.conf_file_name(MAIN_CONF_FILE));
        let conf_dir = Dir::new(self.conf.working_dir().join(CONF_DIR));
        conf_dir.create().await?;
        copy_path(&src, &conf_dir.path().join(MAIN_CONF_FILE)).await
    }

    pub async fn build_project(&self) -> Result<(), DeployError> {
        builder::build_project(self.runner.as_ref(), &self.conf).await
    }

    pub async fn create_archive(
        &self,
        timestamp: &NaiveDateTime,
    ) -> Result<ArchiveLayout, DeployError> {
        self.store.create(timestamp).await
    }

    /// Copy every resolved config file into the archive's `conf` directory
    pub async fn copy_configuration(&self, archive: &ArchiveLayout) -> Result<(), DeployError> {
        let conf_dir = archive.conf_dir();
        conf_dir.create().await?;
        for name in self.conf.kontext_conf_files() {
            conf_dir
                .copy_in(&self.conf.app_config_dir().join(&name))
                .await?;
        }
        Ok(())
    }

    /// Write the provenance record and return its contents
    pub async fn record_deployment_info(
        &self,
        archive: &ArchiveLayout,
        message: Option<&str>,
    ) -> Result<String, DeployError> {
        let commit_info = git::latest_commit(self.runner.as_ref(), &self.conf).await?;
        let mut contents = String::new();
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            contents.push_str(message);
            contents.push_str("\n\n");
        }
        contents.push_str(&commit_info);
        contents.push('\n');
        archive.deploy_info_file().write_string(&contents).await?;
        Ok(contents)
    }

    /// Copy the build outputs from the working copy into the archive
    pub async fn copy_app_to_archive(&self, archive: &ArchiveLayout) -> Result<(), DeployError> {
        let archive_dir = archive.dir();
        for item in &self.conf.build().outputs {
            archive_dir
                .copy_in(&self.conf.working_dir().join(item))
                .await?;
        }
        Ok(())
    }

    /// Empty the live application directory
    pub async fn remove_current_deployment(&self) -> Result<(), DeployError> {
        let removed = Dir::new(self.conf.app_dir()).clear().await?;
        info!("Removed {} entries from {}", removed, self.conf.app_dir().display());
        Ok(())
    }

    /// Copy an archive's payload into the live application directory
    pub async fn deploy_new_version(&self, archive: &ArchiveLayout) -> Result<(), DeployError> {
        let app_dir = Dir::new(self.conf.app_dir());
        for item in self.payload() {
            app_dir.copy_in(&archive.path().join(item)).await?;
        }
        Ok(())
    }
}
