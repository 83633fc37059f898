//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logs::LogLevel;
use crate::reindex::DEFAULT_BULK_SIZE;

/// Token requesting a fresh build instead of an archived one
pub const NEW_ARCHIVE_TOKEN: &str = "new";

/// KonText deployment manager
#[derive(Parser, Debug)]
#[command(name = "kdeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every action that reads `deploy.json`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a JSON config file (default is deploy.json next to the executable)
    #[arg(short = 'c', long = "config-path", env = "KDEPLOY_CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Do not verify that gitUrl is reachable
    #[arg(long)]
    pub skip_remote_check: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the latest version (`new`) or an archived one
    Deploy {
        /// Archive identifier or unique prefix
        #[arg(default_value = NEW_ARCHIVE_TOKEN)]
        archive_id: String,

        /// A custom message stored in the generated archive
        #[arg(short, long)]
        message: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// List archived deployments
    List {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Mark an archive so it can no longer be deployed
    Invalidate {
        /// Archive identifier or unique prefix
        archive_id: String,

        /// Reason stored in the archive
        #[arg(short, long, required = true)]
        message: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Move rotated log files into the log archive
    ArchiveLogs {
        /// Path to the log archiver JSON config
        conf_path: PathBuf,
    },

    /// Run a bulk copy/delete query against the log index
    Reindex {
        /// Path to the reindexing JSON config
        conf_path: PathBuf,

        /// Query identifier as defined in the config
        query_id: String,

        #[arg(long, default_value_t = DEFAULT_BULK_SIZE)]
        bulk_size: usize,
    },

    /// Print version information
    Version,
}
