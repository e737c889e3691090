//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Upstream repository source (GitHub REST API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Base URL of the GitHub REST API
    pub api_url: String,
    /// Optional bearer token for authenticated requests (higher rate limits)
    pub token: Option<String>,
    /// Timeout applied to every individual extraction sub-fetch (in seconds)
    pub fetch_timeout_seconds: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            fetch_timeout_seconds: 5,
        }
    }
}

impl GithubConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

/// Upstream LLM gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible chat-completions gateway
    pub base_url: String,
    /// API key. Absent key is not a startup error: runs fail with a
    /// human-readable error status instead.
    pub api_key: Option<String>,
    /// Model id used by the `critical` and `balanced` depth tiers
    pub economical_model: String,
    /// Model id used by the `complete` depth tier
    pub standard_model: String,
    /// Timeout for a single completion request (in seconds)
    pub request_timeout_seconds: u64,
    /// Maximum attempts per completion call
    pub max_attempts: u32,
    /// Initial backoff delay between attempts (in milliseconds)
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay between attempts (in milliseconds)
    pub max_backoff_ms: u64,
    /// Estimated cost per 1k tokens on the economical model (USD)
    pub economical_cost_per_1k_tokens: f64,
    /// Estimated cost per 1k tokens on the standard model (USD)
    pub standard_cost_per_1k_tokens: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            economical_model: "gpt-4o-mini".to_string(),
            standard_model: "gpt-4o".to_string(),
            request_timeout_seconds: 120,
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            economical_cost_per_1k_tokens: 0.0006,
            standard_cost_per_1k_tokens: 0.005,
        }
    }
}

impl LlmConfig {
    /// Whether an API key is configured at all.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Orchestrator run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Delay inserted between successive report generations (in milliseconds)
    pub inter_call_delay_ms: u64,
    /// Advisory lease lifetime; a crashed run frees the project after this
    pub lease_ttl_seconds: u64,
    /// Client poll interval (in milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 2000,
            lease_ttl_seconds: 900,
            poll_interval_ms: 2000,
        }
    }
}

impl AnalysisConfig {
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "repolens=debug")
    pub level: String,
    /// Output format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from layered sources.
    ///
    /// Precedence (lowest to highest): `config/default`, `config/{RUN_ENV}`,
    /// `config/local`, then `REPOLENS__*` environment variables with `__` as
    /// the section separator (e.g. `REPOLENS__LLM__API_KEY`).
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("RUN_ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        let settings = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("REPOLENS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
