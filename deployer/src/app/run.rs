//! Action dispatch

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use colored::Colorize;
use tracing::{debug, info};

use crate::app::cli::{Commands, ConfigArgs, NEW_ARCHIVE_TOKEN};
use crate::archive::ArchiveStore;
use crate::config::DeploymentConfig;
use crate::deploy::{ReleaseOrchestrator, SystemRunner};
use crate::errors::DeployError;
use crate::logrotate::{LogArchiveConfig, LogArchiver};
use crate::reindex::{ElasticBackend, ReindexConfig, Reindexer};
use crate::utils::version_info;

/// Name of the config file looked up next to the executable
pub const DEFAULT_CONFIG_FILE: &str = "deploy.json";

/// `deploy.json` in the directory of the running executable
pub fn default_config_path() -> Result<PathBuf, DeployError> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_CONFIG_FILE))
}

async fn load_config(args: &ConfigArgs) -> Result<DeploymentConfig, DeployError> {
    let path = match &args.config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    DeploymentConfig::load_file(&path, args.skip_remote_check).await
}

/// Run one command to completion
pub async fn run(command: Commands) -> Result<(), DeployError> {
    match command {
        Commands::Deploy { archive_id, message, config } => {
            let conf = load_config(&config).await?;
            let orchestrator = ReleaseOrchestrator::new(conf, Arc::new(SystemRunner));
            let report = if archive_id == NEW_ARCHIVE_TOKEN {
                let now = Local::now().naive_local();
                orchestrator.deploy_new(&now, message.as_deref()).await?
            } else {
                if message.is_some() {
                    debug!("Ignoring message when installing an existing archive");
                }
                orchestrator.deploy_archive(&archive_id).await?
            };
            info!("Deployed archive {}", report.archive_id);
            Ok(())
        }
        Commands::List { config } => {
            let conf = load_config(&config).await?;
            for line in archive_listing(&ArchiveStore::new(conf.archive_dir())).await? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Invalidate { archive_id, message, config } => {
            let conf = load_config(&config).await?;
            let id =
                invalidate_archive(&ArchiveStore::new(conf.archive_dir()), &archive_id, &message)
                    .await?;
            println!("Archive {} invalidated", id);
            Ok(())
        }
        Commands::ArchiveLogs { conf_path } => {
            let conf = LogArchiveConfig::load(&conf_path).await?;
            conf.validate()?;
            let records = LogArchiver::new(conf)?.process_dir().await?;
            for record in records.iter().filter(|r| r.error.is_some()) {
                eprintln!(
                    "{} {}: {}",
                    "failed".red(),
                    record.src.display(),
                    record.error.as_deref().unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::Reindex { conf_path, query_id, bulk_size } => {
            let conf = ReindexConfig::load(&conf_path).await?;
            let backend = Arc::new(ElasticBackend::new(&conf.url)?);
            let total = Reindexer::new(backend, conf, bulk_size)
                .process_query(&query_id)
                .await?;
            println!("Processed {} documents", total);
            Ok(())
        }
        Commands::Version => {
            println!("{}", serde_json::to_string_pretty(&version_info())?);
            Ok(())
        }
    }
}

/// Invalidate the archive matching `prefix`; returns its full ID
pub async fn invalidate_archive(
    store: &ArchiveStore,
    prefix: &str,
    reason: &str,
) -> Result<String, DeployError> {
    let id = store
        .resolve(prefix)
        .await?
        .ok_or_else(|| DeployError::Input(format!("No matching archive for {}", prefix)))?;
    store.invalidate(&id, reason).await?;
    Ok(id)
}

/// The archive root followed by one line per archive, oldest first
pub async fn archive_listing(store: &ArchiveStore) -> Result<Vec<String>, DeployError> {
    let mut ids = store.list().await?;
    ids.sort();

    let mut lines = vec![format!("Archive: {}", store.root().display())];
    for id in ids {
        match store.invalidation_reason(&id).await? {
            Some(reason) => lines.push(format!(
                "  {} {}",
                id,
                format!("[invalid: {}]", reason).yellow()
            )),
            None => lines.push(format!("  {}", id)),
        }
    }
    Ok(lines)
}

/// Operator-facing description of a failed command
pub fn failure_message(err: &DeployError) -> String {
    if err.is_config() {
        format!("Configuration error: {}", err)
    } else {
        format!("ERROR: {}", err)
    }
}
