//! Search backend interface.

use async_trait::async_trait;
use skimmer_shared::{Result, SearchResponse};

/// Resolves a query string to raw result records.
///
/// Implementations report any failure to produce results as
/// [`SkimmerError::BackendUnavailable`](skimmer_shared::SkimmerError::BackendUnavailable).
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse>;
}
