//! Reachability check for the source repository URL

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::errors::DeployError;

/// Issue a GET against `git_url` and require a 200 answer within `timeout`
pub async fn check_reachable(git_url: &str, timeout: Duration) -> Result<(), DeployError> {
    let url = Url::parse(git_url)
        .map_err(|e| DeployError::Config(format!("Invalid gitUrl {}: {}", git_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DeployError::Config(format!(
            "Cannot verify non-HTTP gitUrl {} (use --skip-remote-check)",
            git_url
        )));
    }

    let client = Client::builder().timeout(timeout).build()?;

    debug!("GET {}", url);
    let response = client.get(url.clone()).send().await.map_err(|e| {
        DeployError::Config(format!("Failed to reach gitUrl {}: {}", git_url, e))
    })?;

    if response.status() != StatusCode::OK {
        return Err(DeployError::Config(format!(
            "gitUrl {} answered with {}",
            git_url,
            response.status()
        )));
    }

    Ok(())
}
