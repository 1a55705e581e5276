//! Generation-checked result store.
//!
//! The store owns the result collection shown to the user. State lives inside a
//! `tokio::sync::watch` sender: every mutation runs under the channel's write
//! lock, so the generation check and the field update happen as one step, and
//! every accepted change wakes subscribed renderers.

use skimmer_shared::{
    EnrichedRecord, Generation, Record, ResultSet, SUMMARY_FAILED_PLACEHOLDER, SummaryState,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::summarizer::SummaryOutcome;

/// Why an `apply` was refused.
#[derive(Debug)]
enum Rejection {
    Stale { current: Generation },
    OutOfRange { len: usize },
    AlreadySettled { state: SummaryState },
}

/// Single source of truth for the displayed result collection.
pub struct ResultStore {
    state: watch::Sender<ResultSet>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    /// An empty store at generation zero.
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(ResultSet::default()),
        }
    }

    /// Replace the collection with pending placeholders for `records`.
    ///
    /// Generations only move forward: a seed older than the current generation
    /// is ignored.
    pub fn seed(&self, generation: Generation, query: impl Into<String>, records: Vec<Record>) {
        let query = query.into();
        let count = records.len();

        let replaced = self.state.send_if_modified(|set| {
            if generation < set.generation {
                return false;
            }
            *set = ResultSet {
                generation,
                query,
                records: records.into_iter().map(EnrichedRecord::pending).collect(),
                search_time_ms: None,
            };
            true
        });

        if replaced {
            debug!(%generation, records = count, "result store seeded");
        } else {
            warn!(
                %generation,
                current = %self.current_generation(),
                "ignoring seed for an older generation"
            );
        }
    }

    /// Apply one enrichment outcome to `position`.
    ///
    /// Returns `false`, leaving the collection untouched, when `generation` is
    /// not current (a stale write from a superseded query), when `position` is
    /// out of range, or when the record already reached a terminal state.
    pub fn apply(&self, position: usize, generation: Generation, outcome: SummaryOutcome) -> bool {
        let mut rejection = None;

        let accepted = self.state.send_if_modified(|set| {
            if set.generation != generation {
                rejection = Some(Rejection::Stale {
                    current: set.generation,
                });
                return false;
            }

            let len = set.records.len();
            let Some(entry) = set.records.get_mut(position) else {
                rejection = Some(Rejection::OutOfRange { len });
                return false;
            };

            if entry.state.is_terminal() {
                rejection = Some(Rejection::AlreadySettled { state: entry.state });
                return false;
            }

            match outcome {
                Ok(text) => {
                    entry.summary = Some(text);
                    entry.state = SummaryState::Ready;
                }
                Err(e) => {
                    entry.summary = Some(SUMMARY_FAILED_PLACEHOLDER.to_string());
                    entry.failure = Some(e.to_string());
                    entry.state = SummaryState::Failed;
                }
            }
            true
        });

        match rejection {
            None => {}
            Some(Rejection::Stale { current }) => {
                debug!(position, %generation, %current, "dropping stale enrichment");
            }
            Some(Rejection::OutOfRange { len }) => {
                warn!(position, len, %generation, "enrichment position out of range");
            }
            Some(Rejection::AlreadySettled { state }) => {
                warn!(position, ?state, %generation, "record already settled, ignoring outcome");
            }
        }

        accepted
    }

    /// Attach the backend-reported search latency to the current collection.
    pub fn record_search_time(&self, generation: Generation, millis: u64) -> bool {
        self.state.send_if_modified(|set| {
            if set.generation != generation {
                return false;
            }
            set.search_time_ms = Some(millis);
            true
        })
    }

    pub fn current_generation(&self) -> Generation {
        self.state.borrow().generation
    }

    /// Clone of the current collection.
    pub fn snapshot(&self) -> ResultSet {
        self.state.borrow().clone()
    }

    /// Change notifications for renderers; each accepted mutation marks the receiver changed.
    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::summarizer::SummarizationError;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("https://example.com/{i}"), format!("page {i}")))
            .collect()
    }

    #[test]
    fn seed_creates_pending_placeholders() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(3));

        let snap = store.snapshot();
        assert_eq!(snap.generation, Generation(1));
        assert_eq!(snap.query, "cats");
        assert_eq!(snap.len(), 3);
        assert!(snap.records.iter().all(|r| r.state == SummaryState::Pending));
        assert_eq!(store.current_generation(), Generation(1));
    }

    #[test]
    fn apply_ready_sets_summary() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(3));

        assert!(store.apply(1, Generation(1), Ok("a page about cats".into())));

        let snap = store.snapshot();
        assert_eq!(snap.records[1].state, SummaryState::Ready);
        assert_eq!(snap.records[1].summary.as_deref(), Some("a page about cats"));
        assert_eq!(snap.records[0].state, SummaryState::Pending);
        assert_eq!(snap.records[2].state, SummaryState::Pending);
    }

    #[test]
    fn apply_failure_sets_placeholder() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(3));

        assert!(store.apply(1, Generation(1), Err(SummarizationError::Empty)));

        let snap = store.snapshot();
        let rec = &snap.records[1];
        assert_eq!(rec.state, SummaryState::Failed);
        assert_eq!(rec.summary.as_deref(), Some(SUMMARY_FAILED_PLACEHOLDER));
        assert_eq!(rec.failure.as_deref(), Some("summarizer returned an empty summary"));
    }

    #[test]
    fn stale_generation_is_rejected() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(3));
        store.seed(Generation(2), "dogs", records(2));
        let before = store.snapshot();

        for pos in 0..3 {
            assert!(!store.apply(pos, Generation(1), Ok("late cat summary".into())));
        }

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn second_apply_does_not_overwrite() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(1));

        assert!(store.apply(0, Generation(1), Ok("first".into())));
        assert!(!store.apply(0, Generation(1), Err(SummarizationError::Empty)));

        let snap = store.snapshot();
        let rec = &snap.records[0];
        assert_eq!(rec.state, SummaryState::Ready);
        assert_eq!(rec.summary.as_deref(), Some("first"));
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(2));
        assert!(!store.apply(5, Generation(1), Ok("nope".into())));
    }

    #[test]
    fn older_seed_is_ignored() {
        let store = ResultStore::new();
        store.seed(Generation(3), "dogs", records(2));
        store.seed(Generation(2), "cats", records(4));

        let snap = store.snapshot();
        assert_eq!(snap.generation, Generation(3));
        assert_eq!(snap.query, "dogs");
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn search_time_only_for_current_generation() {
        let store = ResultStore::new();
        store.seed(Generation(1), "cats", records(1));
        assert!(store.record_search_time(Generation(1), 42));
        assert!(!store.record_search_time(Generation(0), 7));
        assert_eq!(store.snapshot().search_time_ms, Some(42));
    }

    #[tokio::test]
    async fn subscribers_see_accepted_changes_only() {
        let store = ResultStore::new();
        let mut rx = store.subscribe();

        store.seed(Generation(1), "cats", records(2));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        assert!(!store.apply(0, Generation(0), Ok("stale".into())));
        assert!(!rx.has_changed().unwrap());

        assert!(store.apply(0, Generation(1), Ok("fresh".into())));
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().records[0].summary.as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn concurrent_applies_to_distinct_positions() {
        let store = Arc::new(ResultStore::new());
        store.seed(Generation(1), "many", records(64));

        let threads: Vec<_> = (0..64)
            .map(|pos| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.apply(pos, Generation(1), Ok(format!("summary {pos}")))
                })
            })
            .collect();

        for t in threads {
            assert!(t.join().unwrap());
        }

        let snap = store.snapshot();
        assert!(snap.is_settled());
        for (pos, rec) in snap.records.iter().enumerate() {
            assert_eq!(rec.summary.as_deref(), Some(format!("summary {pos}").as_str()));
        }
    }
}
