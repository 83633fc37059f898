//! Logging configuration

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::DeployError;

/// Verbosity of the diagnostic log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by [`EnvFilter`]
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.directive())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub log_level: LogLevel,

    /// One JSON object per event instead of human-readable lines
    pub json_format: bool,
}

/// Install the global subscriber.
///
/// Records go to stderr so that stdout only carries step banners and
/// listings. `RUST_LOG` overrides the configured level.
pub fn init_logging(options: LogOptions) -> Result<(), DeployError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if options.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| DeployError::Config(format!("Cannot initialize logging: {}", e)))
}
