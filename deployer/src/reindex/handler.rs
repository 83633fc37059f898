//! Batched copy/delete of search index documents

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::DeployError;
use crate::reindex::backend::{BulkAction, Hit, SearchBackend};
use crate::reindex::settings::{QueryConfig, QueryOp, ReindexConfig};

pub const DEFAULT_BULK_SIZE: usize = 2000;

/// Runs the configured queries against an index
pub struct Reindexer {
    backend: Arc<dyn SearchBackend>,
    conf: ReindexConfig,
    bulk_size: usize,
}

/// IPv6 addresses are not accepted by the target mapping
fn filter_unsupported_ip_addr(source: &mut Value) {
    if let Some(addr) = source.get_mut("ipAddress") {
        if addr.as_str().is_some_and(|s| s.contains(':')) {
            *addr = Value::Null;
        }
    }
}

impl Reindexer {
    pub fn new(backend: Arc<dyn SearchBackend>, conf: ReindexConfig, bulk_size: usize) -> Self {
        Self {
            backend,
            conf,
            bulk_size: bulk_size.max(1),
        }
    }

    fn to_action(&self, q_conf: &QueryConfig, mut hit: Hit) -> BulkAction {
        match &q_conf.op {
            QueryOp::Copy { target_index } => {
                filter_unsupported_ip_addr(&mut hit.source);
                BulkAction::Index {
                    index: target_index.clone(),
                    doc_type: hit.doc_type.unwrap_or_else(|| q_conf.doc_type.clone()),
                    id: hit.id,
                    source: hit.source,
                }
            }
            QueryOp::Named(_) => BulkAction::Delete {
                index: self.conf.index.clone(),
                doc_type: q_conf.doc_type.clone(),
                id: hit.id,
            },
        }
    }

    /// Process every document matched by `query_id`; returns the accepted count
    pub async fn process_query(&self, query_id: &str) -> Result<usize, DeployError> {
        let q_conf = self.conf.query(query_id)?;
        info!("Running query {} ({:?})", query_id, q_conf.op);

        let mut page = self
            .backend
            .open_scroll(
                &self.conf.index,
                &q_conf.doc_type,
                q_conf.query.as_ref(),
                self.bulk_size,
            )
            .await?;

        let mut scroll_id = page.scroll_id.take();
        let mut batch = Vec::with_capacity(self.bulk_size);
        let mut total = 0;

        while !page.hits.is_empty() {
            for hit in std::mem::take(&mut page.hits) {
                batch.push(self.to_action(q_conf, hit));
                if batch.len() == self.bulk_size {
                    total += self.backend.bulk(&batch).await?;
                    batch.clear();
                    info!("total: {}", total);
                }
            }
            let Some(current) = scroll_id.as_deref() else {
                break;
            };
            page = self.backend.next_page(current).await?;
            if let Some(next) = page.scroll_id.take() {
                scroll_id = Some(next);
            }
        }

        if !batch.is_empty() {
            total += self.backend.bulk(&batch).await?;
            info!("total: {}", total);
        }

        if let Some(scroll_id) = scroll_id {
            if let Err(e) = self.backend.clear_scroll(&scroll_id).await {
                warn!("Failed to clear scroll context: {}", e);
            }
        }

        Ok(total)
    }
}
