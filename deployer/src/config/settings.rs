//! Deployment configuration document and its validated form

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::paths::validate_dir;
use crate::config::remote::check_reachable;
use crate::errors::DeployError;

/// Configuration files KonText reads from its `conf` directory
pub const KONTEXT_CONF_FILES: &[&str] = &[
    "beatconfig.py",
    "celeryconfig.py",
    "config.xml",
    "corpora.xml",
    "gunicorn-conf.py",
    "main-menu.json",
    "tagsets.xml",
];

/// The file refreshed in the working copy before every build
pub const MAIN_CONF_FILE: &str = "config.xml";

/// Raw configuration document as read from `deploy.json`
///
/// Every key is optional at this level so that a missing required key can be
/// reported by name instead of as a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDocument {
    pub app_dir: Option<String>,
    pub working_dir: Option<String>,
    pub archive_dir: Option<String>,
    pub app_config_dir: Option<String>,
    pub git_url: Option<String>,
    pub git_branch: Option<String>,
    pub git_remote: Option<String>,

    /// Standard config file name -> name actually present in `appConfigDir`
    #[serde(default, alias = "confFileAliases")]
    pub kontext_conf_aliases: BTreeMap<String, String>,

    /// Additional files copied along with the standard set
    #[serde(default, alias = "confFileExtras")]
    pub kontext_conf_extras: Vec<String>,

    #[serde(default)]
    pub build: BuildSettings,

    #[serde(default = "default_remote_check_timeout")]
    pub remote_check_timeout_secs: u64,
}

fn default_remote_check_timeout() -> u64 {
    5
}

/// How the working copy is built and what the build produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
    /// Dependency installation, run only when `dependency_marker` is absent
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    /// Production build, run on every forward deployment
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,

    /// Directory in the working copy whose presence means dependencies are installed
    #[serde(default = "default_dependency_marker")]
    pub dependency_marker: String,

    /// Build output entries copied into every archive
    #[serde(default = "default_outputs")]
    pub outputs: Vec<String>,
}

fn default_install_command() -> Vec<String> {
    vec!["npm".to_string(), "install".to_string()]
}

fn default_build_command() -> Vec<String> {
    vec!["grunt".to_string(), "production".to_string()]
}

fn default_dependency_marker() -> String {
    "node_modules".to_string()
}

fn default_outputs() -> Vec<String> {
    ["cmpltmpl", "lib", "locale", "public", "scripts", "package.json", "worker.py"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            install_command: default_install_command(),
            build_command: default_build_command(),
            dependency_marker: default_dependency_marker(),
            outputs: default_outputs(),
        }
    }
}

impl BuildSettings {
    fn validate(&self) -> Result<(), DeployError> {
        if self.install_command.is_empty() {
            return Err(DeployError::Config("build.installCommand must not be empty".into()));
        }
        if self.build_command.is_empty() {
            return Err(DeployError::Config("build.buildCommand must not be empty".into()));
        }
        for output in &self.outputs {
            let mut components = Path::new(output).components();
            let plain = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none();
            if !plain {
                return Err(DeployError::Config(format!(
                    "build output '{}' must be a plain entry name",
                    output
                )));
            }
        }
        Ok(())
    }
}

fn require(key: &str, value: Option<String>) -> Result<String, DeployError> {
    value.ok_or_else(|| DeployError::MissingKey(key.to_string()))
}

/// Validated, immutable deployment configuration
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    app_dir: PathBuf,
    working_dir: PathBuf,
    archive_dir: PathBuf,
    app_config_dir: PathBuf,
    git_url: String,
    git_branch: String,
    git_remote: String,
    conf_file_aliases: BTreeMap<String, String>,
    conf_file_extras: Vec<String>,
    build: BuildSettings,
    remote_check_timeout: Duration,
}

impl DeploymentConfig {
    /// Validate a raw document without contacting the source repository
    pub fn from_document(doc: DeploymentDocument) -> Result<Self, DeployError> {
        let app_dir = require("appDir", doc.app_dir)?;
        let working_dir = require("workingDir", doc.working_dir)?;
        let archive_dir = require("archiveDir", doc.archive_dir)?;
        let app_config_dir = require("appConfigDir", doc.app_config_dir)?;
        let git_url = require("gitUrl", doc.git_url)?;
        let git_branch = require("gitBranch", doc.git_branch)?;
        let git_remote = require("gitRemote", doc.git_remote)?;

        let app_config_dir = validate_dir("appConfigDir", &app_config_dir)?;
        let working_dir = validate_dir("workingDir", &working_dir)?;
        let archive_dir = validate_dir("archiveDir", &archive_dir)?;
        let app_dir = validate_dir("appDir", &app_dir)?;

        doc.build.validate()?;

        Ok(Self {
            app_dir,
            working_dir,
            archive_dir,
            app_config_dir,
            git_url,
            git_branch,
            git_remote,
            conf_file_aliases: doc.kontext_conf_aliases,
            conf_file_extras: doc.kontext_conf_extras,
            build: doc.build,
            remote_check_timeout: Duration::from_secs(doc.remote_check_timeout_secs),
        })
    }

    /// Build the configuration from a parsed JSON document.
    ///
    /// Unless `skip_remote_check` is set, `gitUrl` must answer a GET with 200.
    pub async fn load(document: Value, skip_remote_check: bool) -> Result<Self, DeployError> {
        if !document.is_object() {
            return Err(DeployError::Config(
                "Configuration document must be a JSON object".to_string(),
            ));
        }
        let doc: DeploymentDocument = serde_json::from_value(document)
            .map_err(|e| DeployError::Config(format!("Invalid configuration document: {}", e)))?;

        let conf = Self::from_document(doc)?;

        if skip_remote_check {
            debug!("Skipping reachability check of {}", conf.git_url);
        } else {
            check_reachable(&conf.git_url, conf.remote_check_timeout).await?;
        }

        Ok(conf)
    }

    /// Read the configuration from a JSON file
    pub async fn load_file(path: &Path, skip_remote_check: bool) -> Result<Self, DeployError> {
        info!("Loading configuration from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DeployError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let document: Value = serde_json::from_str(&contents).map_err(|e| {
            DeployError::Config(format!("Config file {} is not valid JSON: {}", path.display(), e))
        })?;
        Self::load(document, skip_remote_check).await
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn app_config_dir(&self) -> &Path {
        &self.app_config_dir
    }

    pub fn git_url(&self) -> &str {
        &self.git_url
    }

    pub fn git_branch(&self) -> &str {
        &self.git_branch
    }

    pub fn git_remote(&self) -> &str {
        &self.git_remote
    }

    pub fn build(&self) -> &BuildSettings {
        &self.build
    }

    /// On-disk name used for a standard config file
    pub fn conf_file_name<'a>(&'a self, standard: &'a str) -> &'a str {
        self.conf_file_aliases
            .get(standard)
            .map(String::as_str)
            .unwrap_or(standard)
    }

    /// Standard config files with aliases applied, followed by the extras
    pub fn kontext_conf_files(&self) -> Vec<String> {
        KONTEXT_CONF_FILES
            .iter()
            .map(|name| self.conf_file_name(name).to_string())
            .chain(self.conf_file_extras.iter().cloned())
            .collect()
    }
}
