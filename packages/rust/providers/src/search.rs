//! HTTP client for the search server.
//!
//! The server takes `POST /search` with `{query, search_type}` and answers
//! `{results, time}`. Older servers return bare URL strings as results; both
//! shapes are accepted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use skimmer_core::SearchBackend;
use skimmer_shared::{BackendConfig, Record, Result, SearchRequest, SearchResponse, SkimmerError};

use crate::USER_AGENT;

/// A result entry as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireRecord {
    Url(String),
    Full(Record),
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        match wire {
            WireRecord::Url(url) => Record::new(url, String::new()),
            WireRecord::Full(record) => record,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    results: Vec<WireRecord>,
    #[serde(default)]
    time: u64,
}

/// Search backend reached over HTTP.
pub struct HttpSearchBackend {
    client: Client,
    endpoint: Url,
    search_type: String,
    max_results: usize,
}

impl HttpSearchBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let endpoint = search_endpoint(&config.base_url)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SkimmerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            search_type: config.search_type.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let request = SearchRequest {
            query: query.to_string(),
            search_type: self.search_type.clone(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SkimmerError::BackendUnavailable(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SkimmerError::BackendUnavailable(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let body: WireResponse = response.json().await.map_err(|e| {
            SkimmerError::BackendUnavailable(format!("{}: invalid response body: {e}", self.endpoint))
        })?;

        let mut results: Vec<Record> = body.results.into_iter().map(Record::from).collect();
        if self.max_results > 0 {
            results.truncate(self.max_results);
        }

        debug!(results = results.len(), time_ms = body.time, "search answered");

        Ok(SearchResponse {
            results,
            time: body.time,
        })
    }
}

/// `{base_url}/search`, keeping any path prefix on the base URL.
fn search_endpoint(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url).map_err(|e| {
        SkimmerError::validation(format!("invalid backend URL '{base_url}': {e}"))
    })?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join("search")
        .map_err(|e| SkimmerError::validation(format!("invalid backend URL '{base_url}': {e}")))
}
