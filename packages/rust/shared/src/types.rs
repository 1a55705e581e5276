//! Core domain types for search results and their enrichment.

use serde::{Deserialize, Serialize};

/// Summary text stored on a record whose summarization failed.
pub const SUMMARY_FAILED_PLACEHOLDER: &str = "AI summary failed.";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Monotonic tag identifying one query's lifetime.
///
/// Every enrichment outcome carries the generation it was scheduled under;
/// outcomes from any generation other than the current one are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation immediately following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A raw search result as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Result URL (unique within a batch in practice, never used as an index).
    pub url: String,
    /// Raw page text to summarize.
    #[serde(default)]
    pub content: String,
}

impl Record {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// Lifecycle of a record's summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryState {
    Pending,
    Ready,
    Failed,
}

impl SummaryState {
    /// `Ready` and `Failed` are final; nothing moves a record out of them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A search result plus its (possibly still pending) summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    /// Summary text once `Ready`, or the failure placeholder once `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub state: SummaryState,
    /// Error text from the summarizer, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl EnrichedRecord {
    /// A fresh placeholder awaiting enrichment.
    pub fn pending(record: Record) -> Self {
        Self {
            record,
            summary: None,
            state: SummaryState::Pending,
            failure: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.record.url
    }
}

// ---------------------------------------------------------------------------
// ResultSet
// ---------------------------------------------------------------------------

/// The observable result collection for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub generation: Generation,
    /// Query these results answer (empty after a clear).
    pub query: String,
    /// Records in backend order; positions are fixed for the generation.
    pub records: Vec<EnrichedRecord>,
    /// Backend-reported search latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_time_ms: Option<u64>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Number of records still waiting for a summary.
    pub fn pending(&self) -> usize {
        self.count(SummaryState::Pending)
    }

    pub fn count(&self, state: SummaryState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }

    /// True once every record has reached `Ready` or `Failed`.
    pub fn is_settled(&self) -> bool {
        self.records.iter().all(|r| r.state.is_terminal())
    }
}

// ---------------------------------------------------------------------------
// Search wire types
// ---------------------------------------------------------------------------

/// Body POSTed to the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: String,
}

/// Search backend response, normalized to full records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Record>,
    /// Backend-side search time in milliseconds.
    pub time: u64,
}
