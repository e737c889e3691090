//! LLM-specific error types
//!
//! Typed errors for gateway operations. Retryability is a property of the
//! error, not of the call site: the invoker asks [`LlmError::is_retryable`]
//! instead of matching on variants.

/// LLM operation error
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Authentication failed (invalid or missing API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limited by the gateway (HTTP 429)
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Seconds to wait before retrying, if the gateway said so
        retry_after: Option<u64>,
        message: String,
    },

    /// Request was rejected by the gateway (bad parameters, oversized prompt)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Gateway returned a 5xx response
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Gateway returned a response the client could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client-side configuration problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// All retry attempts were consumed without a successful completion
    #[error("Exhausted {attempts} attempts without a successful completion")]
    ExhaustedRetries { attempts: u32 },
}

impl LlmError {
    /// Whether the invoker may retry after this error.
    ///
    /// Only rate limits and transient transport failures qualify. A 5xx
    /// body from the gateway is surfaced immediately: the same request
    /// re-sent into a failing backend tends to fail the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Network(_) | LlmError::Timeout { .. }
        )
    }

    /// Whether this error is a rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Gateway-advertised retry delay, if any.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            LlmError::RateLimited { retry_after, .. } => {
                retry_after.map(std::time::Duration::from_secs)
            }
            _ => None,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            retry_after: None,
            message: message.into(),
        }
    }

    pub fn rate_limited_with_retry(message: impl Into<String>, seconds: u64) -> Self {
        Self::RateLimited {
            retry_after: Some(seconds),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { seconds: 0 }
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(format!("JSON parse error: {}", err))
    }
}
