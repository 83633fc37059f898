//! Search engine access for the reindexer

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::errors::DeployError;

/// How long a scroll context is kept alive between pages
pub const SCROLL_KEEPALIVE: &str = "5m";

/// A document returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub index: String,
    pub doc_type: Option<String>,
    pub id: String,
    pub source: Value,
}

/// One page of a scrolled search
#[derive(Debug, Clone, Default)]
pub struct ScrollPage {
    pub scroll_id: Option<String>,
    pub hits: Vec<Hit>,
}

/// One bulk API operation
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    Index {
        index: String,
        doc_type: String,
        id: String,
        source: Value,
    },
    Delete {
        index: String,
        doc_type: String,
        id: String,
    },
}

/// Scrolled search plus bulk writes
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn open_scroll(
        &self,
        index: &str,
        doc_type: &str,
        query: Option<&Value>,
        page_size: usize,
    ) -> Result<ScrollPage, DeployError>;

    async fn next_page(&self, scroll_id: &str) -> Result<ScrollPage, DeployError>;

    /// Release the server-side scroll context
    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), DeployError>;

    /// Returns the number of operations the engine accepted
    async fn bulk(&self, actions: &[BulkAction]) -> Result<usize, DeployError>;
}

/// Elasticsearch over HTTP
pub struct ElasticBackend {
    client: Client,
    base_url: String,
}

impl ElasticBackend {
    pub fn new(base_url: &str) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, DeployError> {
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Search request failed: {} - {}", status, body);
            return Err(DeployError::Internal(format!("{}: {}", status, body)));
        }
        Ok(response.json().await?)
    }
}

fn parse_page(body: &Value) -> ScrollPage {
    let hits = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| Hit {
                    index: item["_index"].as_str().unwrap_or_default().to_string(),
                    doc_type: item["_type"].as_str().map(str::to_string),
                    id: item["_id"].as_str().unwrap_or_default().to_string(),
                    source: item.get("_source").cloned().unwrap_or(Value::Null),
                })
                .collect()
        })
        .unwrap_or_default();
    ScrollPage {
        scroll_id: body["_scroll_id"].as_str().map(str::to_string),
        hits,
    }
}

fn action_meta(index: &str, doc_type: &str, id: &str) -> Value {
    let mut meta = json!({"_index": index, "_id": id});
    if !doc_type.is_empty() {
        meta["_type"] = json!(doc_type);
    }
    meta
}

/// NDJSON body of a bulk request
pub fn bulk_body(actions: &[BulkAction]) -> String {
    let mut body = String::new();
    for action in actions {
        match action {
            BulkAction::Index { index, doc_type, id, source } => {
                body.push_str(&json!({"index": action_meta(index, doc_type, id)}).to_string());
                body.push('\n');
                body.push_str(&source.to_string());
                body.push('\n');
            }
            BulkAction::Delete { index, doc_type, id } => {
                body.push_str(&json!({"delete": action_meta(index, doc_type, id)}).to_string());
                body.push('\n');
            }
        }
    }
    body
}

/// Number of items in a bulk response that succeeded
pub fn count_bulk_successes(response: &Value) -> usize {
    response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().and_then(|o| o.values().next()))
                .filter(|result| {
                    result["status"]
                        .as_u64()
                        .map(|s| (200..300).contains(&s))
                        .unwrap_or(false)
                })
                .count()
        })
        .unwrap_or(0)
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn open_scroll(
        &self,
        index: &str,
        doc_type: &str,
        query: Option<&Value>,
        page_size: usize,
    ) -> Result<ScrollPage, DeployError> {
        let url = if doc_type.is_empty() {
            format!("{}/{}/_search?scroll={}", self.base_url, index, SCROLL_KEEPALIVE)
        } else {
            format!(
                "{}/{}/{}/_search?scroll={}",
                self.base_url, index, doc_type, SCROLL_KEEPALIVE
            )
        };
        let mut body = json!({"size": page_size});
        if let Some(query) = query {
            body["query"] = query.clone();
        }
        let response = self.post_json(&url, &body).await?;
        Ok(parse_page(&response))
    }

    async fn next_page(&self, scroll_id: &str) -> Result<ScrollPage, DeployError> {
        let url = format!("{}/_search/scroll", self.base_url);
        let body = json!({"scroll": SCROLL_KEEPALIVE, "scroll_id": scroll_id});
        let response = self.post_json(&url, &body).await?;
        Ok(parse_page(&response))
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), DeployError> {
        let url = format!("{}/_search/scroll", self.base_url);
        debug!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .json(&json!({"scroll_id": [scroll_id]}))
            .send()
            .await?;
        // an expired context is already gone
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::Internal(format!("{}: {}", status, body)));
        }
        Ok(())
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<usize, DeployError> {
        let url = format!("{}/_bulk", self.base_url);
        debug!("POST {} ({} actions)", url, actions.len());
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(bulk_body(actions))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Bulk request failed: {} - {}", status, body);
            return Err(DeployError::Internal(format!("{}: {}", status, body)));
        }
        let body: Value = response.json().await?;
        Ok(count_bulk_successes(&body))
    }
}
