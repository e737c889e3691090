//! Retry/backoff behavior of the invoker, driven by a scripted provider
//! and tokio's paused clock so the timing assertions are deterministic.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use repolens_llm::{
    CompletionRequest, CompletionResponse, LlmError, LlmInvoker, LlmProvider, Usage,
};

/// Provider that replays a scripted sequence of outcomes and records the
/// (paused-clock) instant of every call.
struct ScriptedProvider {
    script: Mutex<Vec<Result<CompletionResponse, LlmError>>>,
    call_instants: Mutex<Vec<Instant>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script),
            call_instants: Mutex::new(Vec::new()),
        }
    }

    fn instants(&self) -> Vec<Instant> {
        self.call_instants.lock().unwrap().clone()
    }
}

fn ok_response(content: &str) -> CompletionResponse {
    CompletionResponse {
        id: "resp-1".to_string(),
        model: "test-model".to_string(),
        content: content.to_string(),
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_instants.lock().unwrap().push(Instant::now());
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(LlmError::network("script exhausted"));
        }
        script.remove(0)
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_twice_then_success_with_exponential_backoff() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(LlmError::rate_limited("busy")),
        Err(LlmError::rate_limited("busy")),
        Ok(ok_response("generated text")),
    ]));
    let invoker = LlmInvoker::with_defaults(provider.clone());

    let report = invoker
        .invoke("system", "user", "test-model")
        .await
        .unwrap();

    assert_eq!(report.content, "generated text");
    assert_eq!(report.tokens_used, 15);

    let instants = provider.instants();
    assert_eq!(instants.len(), 3);

    let first_gap = instants[1] - instants[0];
    let second_gap = instants[2] - instants[1];
    assert!(first_gap >= std::time::Duration::from_millis(1000));
    assert!(first_gap <= std::time::Duration::from_millis(30_000));
    assert!(second_gap >= std::time::Duration::from_millis(2000));
    assert!(second_gap <= std::time::Duration::from_millis(30_000));
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_fails_immediately() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(LlmError::InvalidRequest("prompt too large".to_string())),
        Ok(ok_response("never reached")),
    ]));
    let invoker = LlmInvoker::with_defaults(provider.clone());

    let err = invoker
        .invoke("system", "user", "test-model")
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::InvalidRequest(_)));
    assert_eq!(provider.instants().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_service_unavailable_fails_immediately() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(LlmError::ServiceUnavailable("overloaded".to_string())),
        Ok(ok_response("never reached")),
    ]));
    let invoker = LlmInvoker::with_defaults(provider.clone());

    let err = invoker
        .invoke("system", "user", "test-model")
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::ServiceUnavailable(_)));
    assert_eq!(provider.instants().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_after_three_attempts() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(LlmError::rate_limited("busy")),
        Err(LlmError::network("reset")),
        Err(LlmError::rate_limited("busy")),
    ]));
    let invoker = LlmInvoker::with_defaults(provider.clone());

    let err = invoker
        .invoke("system", "user", "test-model")
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::ExhaustedRetries { attempts: 3 }));
    assert_eq!(provider.instants().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_missing_usage_falls_back_to_char_estimate() {
    let mut response = ok_response("abcd");
    response.usage = Usage::default();
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(response)]));
    let invoker = LlmInvoker::with_defaults(provider);

    // Prompt: "ab" + "cdef" = 6 chars, completion 4 chars -> ceil(10 / 4) = 3.
    let report = invoker.invoke("ab", "cdef", "test-model").await.unwrap();
    assert_eq!(report.tokens_used, 3);
}
