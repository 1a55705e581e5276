//! Summarization service interface.

use std::borrow::Cow;

use async_trait::async_trait;

/// Why a single summarization call produced no summary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizationError {
    /// The request never got a response (connect error, timeout, ...).
    #[error("summarizer request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("summarizer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not in the expected shape.
    #[error("summarizer response could not be decoded: {0}")]
    Decode(String),

    /// The service answered successfully but with no text.
    #[error("summarizer returned an empty summary")]
    Empty,
}

/// Outcome of one summarization, as applied to the result store.
pub type SummaryOutcome = std::result::Result<String, SummarizationError>;

/// A slow, possibly rate-limited service turning page text into a short summary.
///
/// Latency is unbounded and may vary call to call; callers must not assume
/// completions arrive in the order requests were issued.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `content`, keeping the summary within `max_length` tokens.
    async fn summarize(&self, content: &str, max_length: usize) -> SummaryOutcome;
}

/// Cut `content` to at most `max_chars` characters, on a char boundary.
///
/// Long pages are truncated rather than summarized in chunks.
pub fn truncate_content(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Borrowed(&content[..byte_idx]),
        None => Cow::Borrowed(content),
    }
}
