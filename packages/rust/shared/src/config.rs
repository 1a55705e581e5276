//! Application configuration for Skimmer.
//!
//! User config lives at `~/.skimmer/skimmer.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkimmerError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "skimmer.toml";

/// Largest accepted gap between successive summarization starts.
pub const MAX_SPACING: Duration = Duration::from_secs(60 * 60);

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".skimmer";

// ---------------------------------------------------------------------------
// Config structs (matching skimmer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Summarization service settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Enrichment pacing.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the search server; queries go to `{base_url}/search`.
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Ranking mode forwarded to the backend.
    #[serde(default = "default_search_type")]
    pub search_type: String,

    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,

    /// Results kept per query (0 keeps everything the backend returns).
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            search_type: default_search_type(),
            timeout_secs: default_backend_timeout(),
            max_results: default_max_results(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:3000".into()
}
fn default_search_type() -> String {
    "tfidf".into()
}
fn default_backend_timeout() -> u64 {
    10
}
fn default_max_results() -> usize {
    5
}

/// `[summarizer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// OpenAI-compatible API root; requests go to `{base_url}/chat/completions`.
    #[serde(default = "default_summarizer_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// System prompt sent with every summarization request.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_summarizer_url(),
            model: default_model(),
            system_instruction: default_system_instruction(),
            timeout_secs: default_summarizer_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_summarizer_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "moonshotai/kimi-k2.5".into()
}
fn default_system_instruction() -> String {
    "Summarize the following web page in at most three sentences. \
     Describe what the page is about for someone deciding whether to open it."
        .into()
}
fn default_summarizer_timeout() -> u64 {
    60
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Delay between successive summarization start times.
    #[serde(default = "default_spacing_ms")]
    pub spacing_ms: u64,

    /// Content is cut to this many characters before summarization.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Upper bound on summary length, in tokens.
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,

    /// Cap on concurrent summarization calls (0 = unbounded). A cap makes
    /// later starts wait for earlier completions once it is reached.
    #[serde(default)]
    pub max_in_flight: usize,

    /// Abort a superseded query's pending work instead of letting it drain.
    #[serde(default)]
    pub cancel_superseded: bool,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            spacing_ms: default_spacing_ms(),
            max_content_length: default_max_content_length(),
            max_summary_length: default_max_summary_length(),
            max_in_flight: 0,
            cancel_superseded: false,
        }
    }
}

fn default_spacing_ms() -> u64 {
    1000
}
fn default_max_content_length() -> usize {
    50_000
}
fn default_max_summary_length() -> usize {
    256
}

// ---------------------------------------------------------------------------
// Enrichment config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime enrichment configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Minimum gap between successive unit start times.
    pub spacing: Duration,
    /// Content truncation limit in characters.
    pub max_content_length: usize,
    /// Summary length bound passed to the summarizer.
    pub max_summary_length: usize,
    /// Concurrent summarizer calls; `0` disables the bound.
    pub max_in_flight: usize,
    /// Abort superseded runs on each new query.
    pub cancel_superseded: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self::from(&EnrichmentSettings::default())
    }
}

impl From<&EnrichmentSettings> for EnrichmentConfig {
    fn from(settings: &EnrichmentSettings) -> Self {
        Self {
            spacing: Duration::from_millis(settings.spacing_ms),
            max_content_length: settings.max_content_length,
            max_summary_length: settings.max_summary_length,
            max_in_flight: settings.max_in_flight,
            cancel_superseded: settings.cancel_superseded,
        }
    }
}

impl From<&AppConfig> for EnrichmentConfig {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.enrichment)
    }
}

impl EnrichmentConfig {
    /// Reject settings that would make enrichment meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_content_length == 0 {
            return Err(SkimmerError::validation(
                "enrichment.max_content_length must be greater than zero",
            ));
        }
        if self.max_summary_length == 0 {
            return Err(SkimmerError::validation(
                "enrichment.max_summary_length must be greater than zero",
            ));
        }
        if self.spacing > MAX_SPACING {
            return Err(SkimmerError::validation(format!(
                "enrichment.spacing_ms must be at most {}",
                MAX_SPACING.as_millis()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.skimmer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SkimmerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.skimmer/skimmer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkimmerError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        SkimmerError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    url::Url::parse(&config.backend.base_url).map_err(|e| {
        SkimmerError::config(format!(
            "backend.base_url '{}' is not a valid URL: {e}",
            config.backend.base_url
        ))
    })?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SkimmerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SkimmerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SkimmerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the summarizer API key env var is set and non-empty, returning it.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.summarizer.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(SkimmerError::config(format!(
            "summarizer API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("spacing_ms"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.enrichment.spacing_ms, 1000);
        assert_eq!(parsed.enrichment.max_content_length, 50_000);
        assert_eq!(parsed.summarizer.api_key_env, "OPENROUTER_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[backend]
base_url = "http://search.internal:8080"

[enrichment]
spacing_ms = 250
cancel_superseded = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.backend.base_url, "http://search.internal:8080");
        assert_eq!(config.backend.search_type, "tfidf");
        assert_eq!(config.enrichment.spacing_ms, 250);
        assert_eq!(config.enrichment.max_in_flight, 0);
        assert!(config.enrichment.cancel_superseded);
    }

    #[test]
    fn enrichment_config_from_app_config() {
        let app = AppConfig::default();
        let enrichment = EnrichmentConfig::from(&app);
        assert_eq!(enrichment.spacing, Duration::from_secs(1));
        assert_eq!(enrichment.max_content_length, 50_000);
        assert_eq!(enrichment.max_summary_length, 256);
        assert_eq!(enrichment.max_in_flight, 0);
        assert!(!enrichment.cancel_superseded);
        assert!(enrichment.validate().is_ok());
    }

    #[test]
    fn enrichment_config_rejects_huge_spacing() {
        let config = EnrichmentConfig {
            spacing: Duration::from_millis(u64::MAX),
            ..EnrichmentConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spacing_ms"));

        let at_limit = EnrichmentConfig {
            spacing: MAX_SPACING,
            ..EnrichmentConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn enrichment_config_rejects_zero_content_length() {
        let config = EnrichmentConfig {
            max_content_length: 0,
            ..EnrichmentConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_content_length"));
    }

    #[test]
    fn load_config_rejects_bad_backend_url() {
        let dir = std::env::temp_dir().join(format!("skimmer-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("skimmer.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"not a url\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("backend.base_url"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.summarizer.api_key_env = "SKIMMER_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
