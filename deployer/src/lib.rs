//! KonText deployment library
//!
//! Builds releases from a git working copy, keeps every release as a
//! timestamped archive and installs either the fresh build or an archived one.

pub mod app;
pub mod archive;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logrotate;
pub mod logs;
pub mod reindex;
pub mod utils;
