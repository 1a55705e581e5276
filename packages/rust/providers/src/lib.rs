//! Concrete search backends and summarizers.
//!
//! - [`HttpSearchBackend`] — JSON-over-HTTP search server client
//! - [`FixtureBackend`] — canned results for offline use and demos
//! - [`OpenRouterSummarizer`] — OpenAI-compatible chat-completions summarizer
//! - [`LeadSummarizer`] — offline summarizer returning a page's leading sentences

mod fixture;
mod lead;
mod openrouter;
mod search;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use skimmer_core::{SearchBackend, Summarizer};
use skimmer_shared::{AppConfig, Result, validate_api_key};

pub use fixture::FixtureBackend;
pub use lead::LeadSummarizer;
pub use openrouter::OpenRouterSummarizer;
pub use search::HttpSearchBackend;

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("Skimmer/", env!("CARGO_PKG_VERSION"));

/// The configured search server, or a fixture file when one is given.
pub fn backend_from_config(
    config: &AppConfig,
    fixture: Option<&Path>,
) -> Result<Arc<dyn SearchBackend>> {
    match fixture {
        Some(path) => Ok(Arc::new(FixtureBackend::from_file(path)?)),
        None => Ok(Arc::new(HttpSearchBackend::new(&config.backend)?)),
    }
}

/// The remote summarizer, or a [`LeadSummarizer`] answering after `latency`
/// when `offline` is given.
///
/// Fails when the API key env var is missing and `offline` is not given.
pub fn summarizer_from_config(
    config: &AppConfig,
    offline: Option<Duration>,
) -> Result<Arc<dyn Summarizer>> {
    if let Some(latency) = offline {
        return Ok(Arc::new(LeadSummarizer::new().with_latency(latency)));
    }
    let api_key = validate_api_key(config)?;
    Ok(Arc::new(OpenRouterSummarizer::new(
        &config.summarizer,
        &api_key,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_summarizer_needs_no_key() {
        let mut config = AppConfig::default();
        config.summarizer.api_key_env = "SKIMMER_TEST_UNSET_PROVIDER_KEY".into();
        assert!(summarizer_from_config(&config, Some(Duration::ZERO)).is_ok());
        assert!(summarizer_from_config(&config, None).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn offline_summarizer_applies_latency() {
        let config = AppConfig::default();
        let summarizer =
            summarizer_from_config(&config, Some(Duration::from_millis(750))).unwrap();

        let start = tokio::time::Instant::now();
        let summary = summarizer.summarize("Short page.", 50).await.unwrap();
        assert_eq!(summary, "Short page.");
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[test]
    fn fixture_overrides_http_backend() {
        let config = AppConfig::default();
        let path = Path::new("../../../fixtures/results.json");
        assert!(backend_from_config(&config, Some(path)).is_ok());
        assert!(backend_from_config(&config, None).is_ok());
    }
}
