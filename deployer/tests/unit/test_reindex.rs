//! Reindexer tests against an in-memory search backend

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use kdeploy::errors::DeployError;
use kdeploy::reindex::backend::{BulkAction, Hit, ScrollPage, SearchBackend};
use kdeploy::reindex::{ReindexConfig, Reindexer};

struct FakeBackend {
    pages: Mutex<VecDeque<ScrollPage>>,
    bulks: Mutex<Vec<Vec<BulkAction>>>,
    cleared: Mutex<Vec<String>>,
}

impl FakeBackend {
    /// Serves `docs` in scroll pages of `page_size`
    fn with_docs(docs: Vec<Value>, page_size: usize) -> Self {
        let hits: Vec<Hit> = docs
            .into_iter()
            .enumerate()
            .map(|(i, source)| Hit {
                index: "kontext".to_string(),
                doc_type: Some("query".to_string()),
                id: format!("doc{}", i),
                source,
            })
            .collect();
        let pages = hits
            .chunks(page_size)
            .map(|chunk| ScrollPage {
                scroll_id: Some("scroll-1".to_string()),
                hits: chunk.to_vec(),
            })
            .collect();
        Self {
            pages: Mutex::new(pages),
            bulks: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
        }
    }

    fn pop(&self) -> ScrollPage {
        self.pages.lock().unwrap().pop_front().unwrap_or_default()
    }

    fn bulk_sizes(&self) -> Vec<usize> {
        self.bulks.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn open_scroll(
        &self,
        _index: &str,
        _doc_type: &str,
        _query: Option<&Value>,
        _page_size: usize,
    ) -> Result<ScrollPage, DeployError> {
        Ok(self.pop())
    }

    async fn next_page(&self, _scroll_id: &str) -> Result<ScrollPage, DeployError> {
        Ok(self.pop())
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), DeployError> {
        self.cleared.lock().unwrap().push(scroll_id.to_string());
        Ok(())
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<usize, DeployError> {
        self.bulks.lock().unwrap().push(actions.to_vec());
        Ok(actions.len())
    }
}

fn reindex_conf() -> ReindexConfig {
    serde_json::from_value(json!({
        "url": "http://localhost:9200",
        "index": "kontext",
        "queries": {
            "archive_2015": {
                "query": {"range": {"datetime": {"lt": "2016-01-01"}}},
                "type": "query",
                "op": {"target-index": "kontext-2015"}
            },
            "drop_2015": {"type": "query", "op": "delete"}
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_copy_in_batches() {
    let docs = (0..5)
        .map(|i| json!({"user": i, "ipAddress": "10.0.0.1"}))
        .collect();
    let backend = Arc::new(FakeBackend::with_docs(docs, 3));
    let reindexer = Reindexer::new(backend.clone(), reindex_conf(), 2);

    let total = reindexer.process_query("archive_2015").await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(backend.bulk_sizes(), vec![2, 2, 1]);
    assert_eq!(*backend.cleared.lock().unwrap(), vec!["scroll-1"]);

    let bulks = backend.bulks.lock().unwrap();
    match &bulks[0][0] {
        BulkAction::Index { index, doc_type, id, source } => {
            assert_eq!(index, "kontext-2015");
            assert_eq!(doc_type, "query");
            assert_eq!(id, "doc0");
            assert_eq!(source["ipAddress"], "10.0.0.1");
        }
        other => panic!("Expected index action, got {:?}", other),
    }
}

#[tokio::test]
async fn test_copy_drops_ipv6_addresses() {
    let backend = Arc::new(FakeBackend::with_docs(
        vec![json!({"user": 1, "ipAddress": "2001:718:1e03::1"})],
        10,
    ));
    Reindexer::new(backend.clone(), reindex_conf(), 10)
        .process_query("archive_2015")
        .await
        .unwrap();

    let bulks = backend.bulks.lock().unwrap();
    assert!(matches!(
        &bulks[0][0],
        BulkAction::Index { source, .. } if source["ipAddress"].is_null()
    ));
}

#[tokio::test]
async fn test_delete_targets_source_index() {
    let backend = Arc::new(FakeBackend::with_docs(vec![json!({}), json!({})], 10));
    let total = Reindexer::new(backend.clone(), reindex_conf(), 100)
        .process_query("drop_2015")
        .await
        .unwrap();

    assert_eq!(total, 2);
    let bulks = backend.bulks.lock().unwrap();
    assert_eq!(
        bulks[0][1],
        BulkAction::Delete {
            index: "kontext".to_string(),
            doc_type: "query".to_string(),
            id: "doc1".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unknown_query() {
    let backend = Arc::new(FakeBackend::with_docs(Vec::new(), 1));
    let err = Reindexer::new(backend.clone(), reindex_conf(), 10)
        .process_query("nope")
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Input(_)));
    assert!(backend.bulk_sizes().is_empty());
}
