//! Retrying invoker
//!
//! One call per report: system prompt + user prompt + model in, generated
//! text + token count out. Rate-limit (429) and transient errors are
//! retried with exponential backoff capped at 30s; other gateway errors
//! fail immediately. After the attempt budget is consumed the caller gets
//! [`LlmError::ExhaustedRetries`].

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::{CompletionRequest, LlmError, LlmProvider};

/// Retry policy for completion calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Backoff base delay in milliseconds; attempt `n` waits `base * 2^n`
    pub base_delay_ms: u64,
    /// Ceiling on any single backoff delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after attempt `attempt` (zero-based).
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exp = self.base_delay_ms.saturating_mul(1u64 << attempt.min(31));
        exp.min(self.max_delay_ms)
    }
}

/// One successfully generated report
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub content: String,
    pub tokens_used: u32,
    pub model: String,
}

/// Drives one chat-completion call per report with bounded retry.
pub struct LlmInvoker {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl LlmInvoker {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, RetryPolicy::default())
    }

    /// Perform one completion call with retry/backoff.
    pub async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<GeneratedReport, LlmError> {
        let request = CompletionRequest::new()
            .with_system(system_prompt)
            .with_user(user_prompt)
            .with_model(model);
        let prompt_chars = request.prompt_chars();

        for attempt in 0..self.policy.max_attempts {
            match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    let tokens_used = if response.usage.total_tokens > 0 {
                        response.usage.total_tokens
                    } else {
                        // Gateway did not report usage: estimate from
                        // character counts for cost-accounting parity.
                        estimate_tokens(prompt_chars + response.content.chars().count())
                    };

                    return Ok(GeneratedReport {
                        content: response.content,
                        tokens_used,
                        model: response.model,
                    });
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    let delay_ms = self.policy.backoff_delay_ms(attempt);
                    if e.is_rate_limited() {
                        warn!(
                            provider = self.provider.id(),
                            attempt,
                            delay_ms,
                            "Rate limited by gateway, backing off"
                        );
                    } else {
                        debug!(
                            provider = self.provider.id(),
                            attempt,
                            delay_ms,
                            error = %e,
                            "Transient gateway error, backing off"
                        );
                    }
                    sleep(std::time::Duration::from_millis(delay_ms)).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(provider = self.provider.id(), error = %e, "Retry budget exhausted");
                    return Err(LlmError::ExhaustedRetries {
                        attempts: self.policy.max_attempts,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::ExhaustedRetries {
            attempts: self.policy.max_attempts,
        })
    }
}

/// Estimate token count from a character count: `ceil(chars / 4)`.
///
/// Used only when the gateway omits usage figures. The divisor must stay
/// at 4 to keep historical cost records comparable.
pub fn estimate_tokens(chars: usize) -> u32 {
    (chars.div_ceil(4)).min(u32::MAX as usize) as u32
}
