//! Bulk copy and delete of log documents in the search index

pub mod backend;
pub mod handler;
pub mod settings;

pub use backend::{ElasticBackend, SearchBackend};
pub use handler::{Reindexer, DEFAULT_BULK_SIZE};
pub use settings::{QueryOp, ReindexConfig};
