//! Canned search results loaded from disk or built in memory.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use skimmer_core::SearchBackend;
use skimmer_shared::{Record, Result, SearchResponse, SkimmerError};

use crate::search::WireRecord;

/// Backend answering every query with the same records.
#[derive(Debug, Clone)]
pub struct FixtureBackend {
    records: Vec<Record>,
}

impl FixtureBackend {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records (objects or bare URL strings).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SkimmerError::io(path, e))?;
        let wire: Vec<WireRecord> = serde_json::from_str(&content).map_err(|e| {
            SkimmerError::parse(format!("invalid fixture {}: {e}", path.display()))
        })?;

        let records: Vec<Record> = wire.into_iter().map(Record::from).collect();
        debug!(path = %path.display(), records = records.len(), "loaded search fixture");
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SearchBackend for FixtureBackend {
    async fn search(&self, _query: &str) -> Result<SearchResponse> {
        Ok(SearchResponse {
            results: self.records.clone(),
            time: 0,
        })
    }
}
