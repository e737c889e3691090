//! Application setup and wiring

use std::sync::Arc;

use repolens_core::Config;
use repolens_llm::{LlmInvoker, OpenAiGatewayProvider, RetryPolicy};
use repolens_orchestrator::application::depth::DepthResolver;
use repolens_orchestrator::application::prompts::PromptResolver;
use repolens_orchestrator::application::runner::{AnalysisRunner, RunnerConfig};
use repolens_orchestrator::infrastructure::config_provider::InMemoryConfigProvider;
use repolens_orchestrator::infrastructure::github::{GithubClient, SnapshotExtractor};
use repolens_orchestrator::infrastructure::store::{
    AnalysisStore, InMemoryAnalysisStore, InMemoryLeaseStore, InMemoryProjectStore,
    InMemoryQueueStore, InMemoryUsageStore, ProjectStore, UsageStore,
};

/// Handle to the wired application: the runner plus the stores the
/// polling client reads back from.
pub struct AppHandle {
    pub runner: Arc<AnalysisRunner>,
    pub projects: Arc<dyn ProjectStore>,
    pub analyses: Arc<dyn AnalysisStore>,
    pub usage: Arc<dyn UsageStore>,
}

/// Wire stores, clients, resolvers, and the runner from configuration.
pub fn build_app(config: &Config) -> AppHandle {
    let projects: Arc<InMemoryProjectStore> = Arc::new(InMemoryProjectStore::new());
    let analyses: Arc<InMemoryAnalysisStore> = Arc::new(InMemoryAnalysisStore::new());
    let usage: Arc<InMemoryUsageStore> = Arc::new(InMemoryUsageStore::new());
    let queue = Arc::new(InMemoryQueueStore::new());
    let leases = Arc::new(InMemoryLeaseStore::new());
    let config_provider = Arc::new(InMemoryConfigProvider::new());

    let github_client = Arc::new(GithubClient::new(
        config.github.api_url.clone(),
        config.github.token.clone(),
        config.github.fetch_timeout(),
    ));
    let extractor = Arc::new(SnapshotExtractor::new(github_client));

    let provider = OpenAiGatewayProvider::new(
        config.llm.api_key.clone().unwrap_or_default(),
        config.llm.economical_model.clone(),
    )
    .with_base_url(config.llm.base_url.clone())
    .with_timeout(config.llm.request_timeout_seconds);
    let invoker = Arc::new(LlmInvoker::new(
        Arc::new(provider),
        RetryPolicy {
            max_attempts: config.llm.max_attempts,
            base_delay_ms: config.llm.initial_backoff_ms,
            max_delay_ms: config.llm.max_backoff_ms,
        },
    ));

    let depth_resolver = Arc::new(DepthResolver::new(
        config_provider.clone(),
        config.llm.economical_model.clone(),
        config.llm.standard_model.clone(),
    ));
    let prompt_resolver = Arc::new(PromptResolver::new(config_provider));

    let runner = Arc::new(AnalysisRunner::new(
        projects.clone(),
        analyses.clone(),
        usage.clone(),
        queue,
        leases,
        extractor,
        invoker,
        depth_resolver,
        prompt_resolver,
        RunnerConfig::from_config(config),
    ));

    AppHandle {
        runner,
        projects,
        analyses,
        usage,
    }
}
