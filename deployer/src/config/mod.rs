//! Deployment configuration

pub mod paths;
pub mod remote;
pub mod settings;

pub use settings::{BuildSettings, DeploymentConfig, DeploymentDocument};
