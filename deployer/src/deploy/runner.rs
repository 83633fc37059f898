//! External command execution

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployError;

/// A command line to run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,

    /// Variables layered over the inherited environment
    pub env: BTreeMap<String, String>,

    /// Capture stdout instead of passing it through to the operator
    pub capture_stdout: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
            capture_stdout: false,
        }
    }

    /// Build a spec from an argv vector (program first)
    pub fn from_argv(argv: &[String], cwd: &Path) -> Result<Self, DeployError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DeployError::Config("empty command line".to_string()))?;
        Ok(Self::new(program, args.iter().cloned(), cwd))
    }

    pub fn capture(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// The command line as printed in errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,

    /// Captured stdout; empty unless requested
    pub stdout: String,
}

/// Capability to run external commands.
///
/// Implementations must return [`DeployError::ShellCommand`] on a nonzero
/// exit instead of a successful [`CommandOutput`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, DeployError>;
}

/// Runs commands as child processes of kdeploy
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, DeployError> {
        debug!("Running `{}` in {}", spec.display(), spec.cwd.display());

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(&spec.env)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        if spec.capture_stdout {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
        }

        let output = cmd.output().await.map_err(|e| {
            DeployError::ShellCommand(format!("{} ({})", spec.display(), e))
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if !output.status.success() {
            return Err(DeployError::ShellCommand(spec.display()));
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
