//! Shared harness for orchestrator integration tests: a mocked GitHub
//! API, a mocked chat-completions gateway, and a fully wired runner over
//! in-memory stores.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use repolens_llm::{LlmInvoker, OpenAiGatewayProvider, RetryPolicy};
use repolens_orchestrator::application::depth::DepthResolver;
use repolens_orchestrator::application::prompts::PromptResolver;
use repolens_orchestrator::application::runner::{AnalysisRunner, RunnerConfig};
use repolens_orchestrator::domain::snapshot::{FileExcerpt, RepoMetadata, RepoSnapshot};
use repolens_orchestrator::infrastructure::config_provider::InMemoryConfigProvider;
use repolens_orchestrator::infrastructure::github::{GithubClient, SnapshotExtractor};
use repolens_orchestrator::infrastructure::store::{
    InMemoryAnalysisStore, InMemoryLeaseStore, InMemoryProjectStore, InMemoryQueueStore,
    InMemoryUsageStore,
};

pub struct Harness {
    pub github: MockServer,
    pub gateway: MockServer,
    pub projects: Arc<InMemoryProjectStore>,
    pub analyses: Arc<InMemoryAnalysisStore>,
    pub usage: Arc<InMemoryUsageStore>,
    pub queue: Arc<InMemoryQueueStore>,
    pub leases: Arc<InMemoryLeaseStore>,
    pub config_provider: Arc<InMemoryConfigProvider>,
    pub runner: Arc<AnalysisRunner>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_credentials(true).await
    }

    pub async fn with_credentials(credentials_present: bool) -> Self {
        let github = MockServer::start().await;
        let gateway = MockServer::start().await;

        let projects = Arc::new(InMemoryProjectStore::new());
        let analyses = Arc::new(InMemoryAnalysisStore::new());
        let usage = Arc::new(InMemoryUsageStore::new());
        let queue = Arc::new(InMemoryQueueStore::new());
        let leases = Arc::new(InMemoryLeaseStore::new());
        let config_provider = Arc::new(InMemoryConfigProvider::new());

        let client = Arc::new(GithubClient::new(
            github.uri(),
            None,
            Duration::from_secs(5),
        ));
        let extractor = Arc::new(SnapshotExtractor::new(client));

        let provider =
            OpenAiGatewayProvider::new("test-key", "gpt-4o-mini").with_base_url(gateway.uri());
        // Millisecond backoff keeps retry-path tests fast
        let invoker = Arc::new(LlmInvoker::new(
            Arc::new(provider),
            RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 10,
            },
        ));

        let depth_resolver = Arc::new(DepthResolver::new(
            config_provider.clone(),
            "gpt-4o-mini",
            "gpt-4o",
        ));
        let prompt_resolver = Arc::new(PromptResolver::new(config_provider.clone()));

        let runner = Arc::new(AnalysisRunner::new(
            projects.clone(),
            analyses.clone(),
            usage.clone(),
            queue.clone(),
            leases.clone(),
            extractor,
            invoker,
            depth_resolver,
            prompt_resolver,
            RunnerConfig {
                credentials_present,
                inter_call_delay: Duration::from_millis(1),
                lease_ttl_seconds: 900,
                standard_model: "gpt-4o".to_string(),
                economical_cost_per_1k_tokens: 0.0006,
                standard_cost_per_1k_tokens: 0.005,
            },
        ));

        Self {
            github,
            gateway,
            projects,
            analyses,
            usage,
            queue,
            leases,
            config_provider,
            runner,
        }
    }

    /// Mount a small but complete fake repository on the GitHub mock.
    pub async fn mount_repository(&self) {
        Mock::given(method("GET"))
            .and(path("/repos/acme/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "app",
                "description": "A sample app",
                "language": "TypeScript",
                "stargazers_count": 42,
                "forks_count": 7
            })))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/readme"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# App\n\nHello."))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "index.ts", "path": "index.ts", "type": "file"},
                {"name": "package.json", "path": "package.json", "type": "file"},
                {"name": "src", "path": "src", "type": "dir"}
            ])))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/src"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "main.ts", "path": "src/main.ts", "type": "file"}
            ])))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/package.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"name": "app", "version": "1.0.0", "dependencies": {"react": "^18"}}"#,
            ))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/index.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("console.log('index')"))
            .mount(&self.github)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/src/main.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("console.log('main')"))
            .mount(&self.github)
            .await;
    }

    /// Mount an always-succeeding gateway.
    pub async fn mount_gateway_ok(&self, model: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(model)))
            .mount(&self.gateway)
            .await;
    }
}

pub fn completion_body(model: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "model": model,
        "choices": [
            {"message": {"role": "assistant", "content": "# Report\n\nGenerated content."}}
        ],
        "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
    })
}

/// A snapshot fixture for tests that bypass extraction.
pub fn seeded_snapshot() -> RepoSnapshot {
    RepoSnapshot {
        metadata: RepoMetadata {
            name: "app".into(),
            description: Some("A sample app".into()),
            language: Some("TypeScript".into()),
            stars: 42,
            forks: 7,
        },
        readme: Some("# App\n\nHello.".into()),
        file_tree: vec!["src/".into(), "src/main.ts".into(), "index.ts".into()],
        package_summary: None,
        source_excerpts: vec![FileExcerpt {
            path: "src/main.ts".into(),
            content: "console.log('main')".into(),
            truncated: false,
        }],
        config_excerpts: vec![],
    }
}
