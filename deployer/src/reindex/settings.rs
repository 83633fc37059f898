//! Reindexing configuration

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DeployError;
use crate::filesys::file::File;

/// Search endpoint, index and the named queries that can be run against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexConfig {
    pub url: String,
    pub index: String,

    #[serde(default)]
    pub queries: BTreeMap<String, QueryConfig>,
}

/// A named query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Search DSL query; all documents when absent
    #[serde(default)]
    pub query: Option<Value>,

    /// Document type filter
    #[serde(rename = "type")]
    pub doc_type: String,

    pub op: QueryOp,
}

/// What happens to the matched documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOp {
    /// Copy into another index
    Copy {
        #[serde(rename = "target-index")]
        target_index: String,
    },
    Named(NamedOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedOp {
    Delete,
}

impl ReindexConfig {
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        File::new(path).read_json().await.map_err(|e| {
            DeployError::Config(format!("Cannot load {}: {}", path.display(), e))
        })
    }

    pub fn query(&self, query_id: &str) -> Result<&QueryConfig, DeployError> {
        self.queries
            .get(query_id)
            .ok_or_else(|| DeployError::Input(format!("Unknown query {}", query_id)))
    }
}
