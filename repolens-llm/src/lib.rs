//! RepoLens LLM — gateway client for the report-generation pipeline.
//!
//! Provides provider-agnostic message/request types, a typed [`LlmError`]
//! taxonomy with retryability classification, an OpenAI-compatible gateway
//! provider, and [`LlmInvoker`] which wraps a provider with bounded retry
//! and exponential backoff for rate limiting.

pub mod domain;
pub mod infrastructure;

pub use domain::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, Role, Usage,
};
pub use infrastructure::invoker::{GeneratedReport, LlmInvoker, RetryPolicy, estimate_tokens};
pub use infrastructure::providers::OpenAiGatewayProvider;
