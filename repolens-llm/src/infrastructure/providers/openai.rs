//! OpenAI-compatible gateway provider
//!
//! Works against any endpoint that speaks the `/chat/completions` wire
//! format (`{model, messages}` in, `choices[0].message.content` + `usage`
//! out). HTTP 429 is surfaced as [`LlmError::RateLimited`] with the
//! `Retry-After` header value when present, so the invoker can back off.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::domain::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, Usage};

/// OpenAI-compatible chat-completion provider
pub struct OpenAiGatewayProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGatewayProvider {
    /// Create a new provider against the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build HTTP client with custom timeout, using default client");
                Client::new()
            });

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    /// Point the provider at a different gateway base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.client = Client::builder()
            .timeout(Duration::from_secs(seconds))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to rebuild HTTP client, keeping default timeout");
                Client::new()
            });
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn parse_wire_response(&self, response: WireResponse) -> Result<CompletionResponse, LlmError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| {
                LlmError::InvalidResponse("Response contained no message content".to_string())
            })?;

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: response.id,
            model: response.model,
            content,
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiGatewayProvider {
    fn id(&self) -> &'static str {
        "openai_gateway"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "LLM API key is not configured".to_string(),
            ));
        }

        let wire_request = self.to_wire_request(&request);
        debug!(model = %wire_request.model, "Sending chat-completion request");

        let response = self
            .client
            .post(self.chat_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&wire_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => match retry_after {
                    Some(seconds) => LlmError::rate_limited_with_retry(body, seconds),
                    None => LlmError::rate_limited(body),
                },
                401 | 403 => LlmError::auth(body),
                s if s >= 500 => LlmError::ServiceUnavailable(body),
                _ => {
                    error!(status = %status, "Gateway error: {}", body);
                    LlmError::InvalidRequest(format!("API error {}: {}", status, body))
                }
            });
        }

        let wire_response: WireResponse = response.json().await?;
        self.parse_wire_response(wire_response)
    }
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    id: String,
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
