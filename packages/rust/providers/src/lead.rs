//! Offline summarizer: the leading sentences of a page.

use std::time::Duration;

use async_trait::async_trait;

use skimmer_core::{SummarizationError, Summarizer, SummaryOutcome};

/// Sentences kept when the word budget allows.
const MAX_SENTENCES: usize = 2;

/// Summarizer that needs no network: it returns the first sentences of the content.
///
/// An optional artificial latency makes it behave like a slow remote service.
#[derive(Debug, Clone, Default)]
pub struct LeadSummarizer {
    latency: Duration,
}

impl LeadSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize(&self, content: &str, max_length: usize) -> SummaryOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let lead = lead_sentences(content, max_length);
        if lead.is_empty() {
            return Err(SummarizationError::Empty);
        }
        Ok(lead)
    }
}

/// Up to [`MAX_SENTENCES`] sentences, cut at `max_words` words.
fn lead_sentences(content: &str, max_words: usize) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut sentences = 0;

    for word in content.split_whitespace().take(max_words) {
        out.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences += 1;
            if sentences == MAX_SENTENCES {
                break;
            }
        }
    }

    out.join(" ")
}
