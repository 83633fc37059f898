//! Deployment archives

pub mod layout;
pub mod store;

pub use layout::ArchiveLayout;
pub use store::{archive_id_for, ArchiveStore};
