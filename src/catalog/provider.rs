//! HTTP client for the upstream music catalog provider.
//!
//! The provider exposes a saavn-style JSON API: search endpoints wrap their
//! hits in `data.results`, detail endpoints in `data`. Payloads are treated
//! as untrusted and handed to the normalizer as raw values.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://saavn.dev/api";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("catalog responded with status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("catalog response had an unexpected shape")]
    UnexpectedShape,
}

pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!("Catalog provider returned {} for {}", response.status(), url);
            return Err(CatalogError::BadStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Searches songs by keyword, returns the raw result records.
    pub async fn search_songs(&self, query: &str) -> Result<Vec<Value>, CatalogError> {
        let url = format!(
            "{}/search/songs?query={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let body = self.get_json(&url).await?;
        extract_results(&body)
    }

    /// Searches artists by keyword, returns the raw result records.
    pub async fn search_artists(&self, query: &str) -> Result<Vec<Value>, CatalogError> {
        let url = format!(
            "{}/search/artists?query={}&page=0&limit=10",
            self.base_url,
            urlencoding::encode(query)
        );
        let body = self.get_json(&url).await?;
        extract_results(&body)
    }

    /// Fetches the detail payload for one artist.
    pub async fn get_artist(&self, id: &str) -> Result<Value, CatalogError> {
        let url = format!("{}/artists?id={}", self.base_url, urlencoding::encode(id));
        let body = self.get_json(&url).await?;
        extract_data(&body)
    }

    /// Fetches the detail payload for one album.
    pub async fn get_album(&self, id: &str) -> Result<Value, CatalogError> {
        let url = format!("{}/albums?id={}", self.base_url, urlencoding::encode(id));
        let body = self.get_json(&url).await?;
        extract_data(&body)
    }
}

fn extract_results(body: &Value) -> Result<Vec<Value>, CatalogError> {
    match body.get("data").and_then(|data| data.get("results")) {
        Some(Value::Array(results)) => Ok(results.clone()),
        // A present but empty data section means no hits, not a broken response.
        Some(Value::Null) | None if body.get("data").is_some() => Ok(vec![]),
        _ => Err(CatalogError::UnexpectedShape),
    }
}

fn extract_data(body: &Value) -> Result<Value, CatalogError> {
    body.get("data")
        .filter(|data| data.is_object())
        .cloned()
        .ok_or(CatalogError::UnexpectedShape)
}
