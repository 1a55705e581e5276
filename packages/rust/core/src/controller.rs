//! Query lifecycle orchestration: search, seed, enrich.

use std::sync::Arc;

use skimmer_shared::{EnrichmentConfig, Generation};
use tracing::{debug, info, instrument, warn};

use crate::backend::SearchBackend;
use crate::scheduler::{PacedScheduler, RunHandle, RunSummary};
use crate::store::ResultStore;
use crate::summarizer::Summarizer;

/// What a `submit` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty query: the store was cleared under a fresh generation.
    Cleared { generation: Generation },
    /// Results were seeded and an enrichment run started.
    Started {
        generation: Generation,
        results: usize,
    },
    /// The backend failed; the displayed results were left as they were.
    BackendFailed { error: String },
}

/// Drives one query at a time from submission to an enriched result set.
///
/// The controller is the only place generations are minted. It is meant to be
/// owned by a single control task; renderers read the shared [`ResultStore`].
pub struct QueryController {
    backend: Arc<dyn SearchBackend>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<ResultStore>,
    scheduler: PacedScheduler,
    generation: Generation,
    active: Option<RunHandle>,
}

impl QueryController {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        summarizer: Arc<dyn Summarizer>,
        config: EnrichmentConfig,
    ) -> Self {
        Self::with_store(backend, summarizer, config, Arc::new(ResultStore::new()))
    }

    /// Build a controller around an existing store, continuing from its generation.
    pub fn with_store(
        backend: Arc<dyn SearchBackend>,
        summarizer: Arc<dyn Summarizer>,
        config: EnrichmentConfig,
        store: Arc<ResultStore>,
    ) -> Self {
        let generation = store.current_generation();
        Self {
            backend,
            summarizer,
            store,
            scheduler: PacedScheduler::new(config),
            generation,
            active: None,
        }
    }

    /// Shared handle to the observable result store.
    pub fn store(&self) -> Arc<ResultStore> {
        self.store.clone()
    }

    /// Generation of the most recent seeded query.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Run a new query.
    ///
    /// Any enrichment still running for an earlier query is superseded: its
    /// writes are rejected by the store, and with `cancel_superseded` its
    /// pending units are aborted outright.
    #[instrument(skip(self), fields(generation))]
    pub async fn submit(&mut self, query: &str) -> SubmitOutcome {
        let query = query.trim();

        if query.is_empty() {
            let generation = self.advance();
            self.store.seed(generation, "", Vec::new());
            info!(%generation, "empty query, results cleared");
            return SubmitOutcome::Cleared { generation };
        }

        let response = match self.backend.search(query).await {
            Ok(response) => response,
            Err(e) => {
                warn!(query, error = %e, "search failed, keeping current results");
                return SubmitOutcome::BackendFailed {
                    error: e.to_string(),
                };
            }
        };

        let generation = self.advance();
        tracing::Span::current().record("generation", tracing::field::display(generation));

        let results = response.results.len();
        self.store.seed(generation, query, response.results.clone());
        self.store.record_search_time(generation, response.time);

        info!(
            %generation,
            results,
            search_ms = response.time,
            "query seeded, starting enrichment"
        );

        let run = self.scheduler.run(
            response.results,
            generation,
            self.store.clone(),
            self.summarizer.clone(),
        );
        self.active = Some(run);

        SubmitOutcome::Started {
            generation,
            results,
        }
    }

    /// Wait for the current query's enrichment run to finish.
    ///
    /// Returns `None` when no run is active (nothing submitted yet, or the
    /// last submit cleared the results).
    pub async fn wait_idle(&mut self) -> Option<RunSummary> {
        let run = self.active.take()?;
        Some(run.join().await)
    }

    /// Mint the next generation, retiring the active run.
    fn advance(&mut self) -> Generation {
        if let Some(previous) = self.active.take() {
            if self.scheduler.config().cancel_superseded && !previous.is_finished() {
                debug!(generation = %previous.generation(), "aborting superseded enrichment run");
                previous.abort();
            }
        }
        self.generation = self.generation.next();
        self.generation
    }
}
