//! LLM provider trait
//!
//! The orchestration core talks to a single upstream gateway, but the seam
//! is kept as a trait so tests can substitute deterministic fakes.

use async_trait::async_trait;

use crate::domain::error::LlmError;
use crate::domain::messages::{CompletionRequest, CompletionResponse};

/// Chat-completion backend.
///
/// Object-safe; used as `Arc<dyn LlmProvider>` throughout.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable provider identifier for logs.
    fn id(&self) -> &'static str;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;

    /// Generate a completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
