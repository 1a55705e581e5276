//! In-process fakes for the summarizer and search backend.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use skimmer_shared::{Record, Result, SearchResponse, SkimmerError};
use tokio::time::Instant;

use crate::backend::SearchBackend;
use crate::summarizer::{SummarizationError, Summarizer, SummaryOutcome};

/// `n` records whose content is `page {i}`.
pub(crate) fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::new(format!("https://example.com/{i}"), format!("page {i}")))
        .collect()
}

/// One observed summarizer call.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub content: String,
    pub max_length: usize,
    pub at: Instant,
}

/// Summarizer with per-content latency and failures, answering `summary of {content}`.
pub(crate) struct ScriptedSummarizer {
    default_delay: Duration,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    completions: AtomicUsize,
}

impl ScriptedSummarizer {
    pub(crate) fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            delays: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, content: &str, delay: Duration) -> Self {
        self.delays.insert(content.to_string(), delay);
        self
    }

    pub(crate) fn failing(mut self, content: &str) -> Self {
        self.failing.insert(content.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that ran to the end rather than being dropped mid-flight.
    pub(crate) fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, content: &str, max_length: usize) -> SummaryOutcome {
        self.calls.lock().unwrap().push(Call {
            content: content.to_string(),
            max_length,
            at: Instant::now(),
        });

        let delay = self
            .delays
            .get(content)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.completions.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(content) {
            return Err(SummarizationError::Status {
                status: 500,
                body: "upstream error".into(),
            });
        }
        Ok(format!("summary of {content}"))
    }
}

/// Backend answering from a fixed query → records table.
#[derive(Default)]
pub(crate) struct TableBackend {
    table: HashMap<String, Vec<Record>>,
    down: bool,
    queries: Mutex<Vec<String>>,
}

impl TableBackend {
    pub(crate) fn with(mut self, query: &str, results: Vec<Record>) -> Self {
        self.table.insert(query.to_string(), results);
        self
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for TableBackend {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.down {
            return Err(SkimmerError::BackendUnavailable("connection refused".into()));
        }
        Ok(SearchResponse {
            results: self.table.get(query).cloned().unwrap_or_default(),
            time: 3,
        })
    }
}
