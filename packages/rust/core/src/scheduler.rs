//! Paced enrichment scheduler.
//!
//! A run spawns one unit per record. Unit `i` starts no earlier than
//! `(i + 1) * spacing` after the run began; units never wait on each other's
//! completion, so a slow summary does not hold back the ones behind it. An
//! optional semaphore caps how many summarizer calls are in flight at once.

use std::sync::Arc;
use std::time::Duration;

use skimmer_shared::{EnrichmentConfig, Generation, Record, SummaryState};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, debug_span, info, instrument, warn};

use crate::store::ResultStore;
use crate::summarizer::{Summarizer, truncate_content};

// ---------------------------------------------------------------------------
// Tasks and outcomes
// ---------------------------------------------------------------------------

/// One pending enrichment: which record, where it lands, and when it may start.
#[derive(Debug, Clone)]
pub struct EnrichmentTask {
    /// Position in the seeded collection.
    pub position: usize,
    /// Generation the task was created under.
    pub generation: Generation,
    pub record: Record,
    /// Earliest start, measured from the beginning of the run.
    pub start_offset: Duration,
}

/// What happened to a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The store accepted the outcome and the record is now in this state.
    Applied(SummaryState),
    /// The summarizer was called but the store rejected the result.
    Stale,
    /// The generation was superseded before the call; the summarizer was never invoked.
    Skipped,
}

/// Tally of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ready: usize,
    pub failed: usize,
    pub stale: usize,
    pub skipped: usize,
    /// Units aborted before they finished.
    pub cancelled: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Applied(SummaryState::Ready) => self.ready += 1,
            UnitOutcome::Applied(_) => self.failed += 1,
            UnitOutcome::Stale => self.stale += 1,
            UnitOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ready + self.failed + self.stale + self.skipped + self.cancelled
    }
}

// ---------------------------------------------------------------------------
// RunHandle
// ---------------------------------------------------------------------------

/// Handle to the units of one run.
///
/// Dropping the handle detaches the units; they keep running to completion.
#[derive(Debug)]
pub struct RunHandle {
    generation: Generation,
    units: Vec<JoinHandle<UnitOutcome>>,
}

impl RunHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of units in the run.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.units.iter().all(|u| u.is_finished())
    }

    /// Cancel every unit that has not finished yet, including in-flight summarizer calls.
    pub fn abort(&self) {
        for unit in &self.units {
            unit.abort();
        }
    }

    /// Wait for every unit and tally the outcomes.
    pub async fn join(self) -> RunSummary {
        let mut summary = RunSummary::default();
        for unit in self.units {
            match unit.await {
                Ok(outcome) => summary.record(outcome),
                Err(e) if e.is_cancelled() => summary.cancelled += 1,
                Err(e) => {
                    warn!(generation = %self.generation, error = %e, "enrichment unit panicked");
                    summary.cancelled += 1;
                }
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// PacedScheduler
// ---------------------------------------------------------------------------

/// Issues delay-spaced, bounded-concurrency summarization calls for a batch of records.
#[derive(Debug, Clone)]
pub struct PacedScheduler {
    config: EnrichmentConfig,
}

impl PacedScheduler {
    pub fn new(config: EnrichmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Lay out the tasks of a run: record `i` may start at `(i + 1) * spacing`.
    pub fn plan(&self, records: Vec<Record>, generation: Generation) -> Vec<EnrichmentTask> {
        records
            .into_iter()
            .enumerate()
            .map(|(position, record)| EnrichmentTask {
                position,
                generation,
                record,
                start_offset: self.config.spacing.saturating_mul(position as u32 + 1),
            })
            .collect()
    }

    /// Start enriching `records` for `generation` without waiting for any of it.
    ///
    /// Must be called from within a Tokio runtime. Outcomes are written to
    /// `store`, which discards them if `generation` has been superseded.
    #[instrument(skip_all, fields(generation = %generation, records = records.len()))]
    pub fn run(
        &self,
        records: Vec<Record>,
        generation: Generation,
        store: Arc<ResultStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> RunHandle {
        let started = Instant::now();
        let limiter = match self.config.max_in_flight {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        info!(
            spacing_ms = self.config.spacing.as_millis() as u64,
            max_in_flight = self.config.max_in_flight,
            "enrichment run started"
        );

        let units = self
            .plan(records, generation)
            .into_iter()
            .map(|task| {
                let span = debug_span!("enrich", position = task.position, url = %task.record.url);
                let unit = Unit {
                    task,
                    started,
                    store: store.clone(),
                    summarizer: summarizer.clone(),
                    limiter: limiter.clone(),
                    max_content_length: self.config.max_content_length,
                    max_summary_length: self.config.max_summary_length,
                };
                tokio::spawn(unit.execute().instrument(span))
            })
            .collect();

        RunHandle { generation, units }
    }
}

/// Everything one spawned unit owns.
struct Unit {
    task: EnrichmentTask,
    started: Instant,
    store: Arc<ResultStore>,
    summarizer: Arc<dyn Summarizer>,
    limiter: Option<Arc<Semaphore>>,
    max_content_length: usize,
    max_summary_length: usize,
}

impl Unit {
    async fn execute(self) -> UnitOutcome {
        let task = self.task;

        match self.started.checked_add(task.start_offset) {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            // Past the clock's range; `sleep` parks the unit indefinitely instead.
            None => tokio::time::sleep(task.start_offset).await,
        }
        if self.store.current_generation() != task.generation {
            debug!("generation superseded before start, skipping");
            return UnitOutcome::Skipped;
        }

        let _permit = match &self.limiter {
            Some(limiter) => match limiter.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => return UnitOutcome::Skipped,
            },
            None => None,
        };
        // Waiting for a permit can outlast the generation too.
        if self.store.current_generation() != task.generation {
            debug!("generation superseded while queued, skipping");
            return UnitOutcome::Skipped;
        }

        let content = truncate_content(&task.record.content, self.max_content_length);
        debug!(chars = content.chars().count(), "requesting summary");
        let outcome = self
            .summarizer
            .summarize(&content, self.max_summary_length)
            .await;

        let state = match &outcome {
            Ok(_) => SummaryState::Ready,
            Err(e) => {
                warn!(url = %task.record.url, error = %e, "summarization failed");
                SummaryState::Failed
            }
        };

        if self.store.apply(task.position, task.generation, outcome) {
            debug!(?state, "summary applied");
            UnitOutcome::Applied(state)
        } else {
            UnitOutcome::Stale
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
