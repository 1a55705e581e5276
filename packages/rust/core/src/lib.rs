//! Progressive enrichment core for Skimmer.
//!
//! A query's results are seeded into a [`ResultStore`] as pending records, then
//! a [`PacedScheduler`] run summarizes them one staggered start at a time.
//! [`QueryController`] ties the two together and mints the generation tag
//! that lets the store drop writes belonging to a superseded query.

pub mod backend;
pub mod controller;
pub mod scheduler;
pub mod store;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use backend::SearchBackend;
pub use controller::{QueryController, SubmitOutcome};
pub use scheduler::{EnrichmentTask, PacedScheduler, RunHandle, RunSummary, UnitOutcome};
pub use store::ResultStore;
pub use summarizer::{SummarizationError, Summarizer, SummaryOutcome, truncate_content};
