//! Summarizer backed by an OpenAI-compatible chat-completions API (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use skimmer_core::{SummarizationError, Summarizer, SummaryOutcome};
use skimmer_shared::{Result, SkimmerError, SummarizerConfig};

use crate::USER_AGENT;

/// Error bodies are cut to this many bytes before being kept.
const MAX_ERROR_BODY: usize = 200;

/// Chat-completions client producing one summary per call.
pub struct OpenRouterSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    system_instruction: String,
}

impl OpenRouterSummarizer {
    /// Build a summarizer using `api_key` for bearer authentication.
    pub fn new(config: &SummarizerConfig, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| SkimmerError::config("summarizer API key contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SkimmerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            system_instruction: config.system_instruction.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for OpenRouterSummarizer {
    #[instrument(skip_all, fields(model = %self.model, chars = content.len()))]
    async fn summarize(&self, content: &str, max_length: usize) -> SummaryOutcome {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: max_length,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            if text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| text.is_char_boundary(i))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            return Err(SummarizationError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::Decode(e.to_string()))?;

        let summary = parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if summary.is_empty() {
            return Err(SummarizationError::Empty);
        }

        if let Some(usage) = parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "summary received"
            );
        }

        Ok(summary)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
