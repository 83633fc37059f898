//! Archiving of rotated application logs

pub mod archiver;
pub mod settings;

pub use archiver::{LogArchiver, WorklogRecord};
pub use settings::LogArchiveConfig;
