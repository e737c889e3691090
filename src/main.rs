//! RepoLens - Main application entry point
//!
//! Accepts a GitHub repository URL, starts a background analysis run, and
//! polls it to completion, printing the generated reports to stdout.

use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;

use repolens::{Config, build_app, init_tracing};
use repolens_core::config::validation::Validate;
use repolens_orchestrator::application::poller::{
    PollDirective, PollObservation, PollerConfig, StatusPoller, SystemClock,
};
use repolens_orchestrator::application::runner::StartAnalysisRequest;
use repolens_orchestrator::domain::value_objects::{AnalysisType, DepthLevel};

/// RepoLens - Generate analysis reports for a GitHub repository
#[derive(Parser, Debug)]
#[command(
    name = "repolens",
    version,
    about = "Generate product, architecture, and strategy reports for a GitHub repository"
)]
struct Cli {
    /// GitHub repository URL (e.g. https://github.com/acme/app)
    github_url: String,

    /// Report types to generate, comma-separated, or "all"
    #[arg(short, long, default_value = "all", value_delimiter = ',')]
    types: Vec<String>,

    /// Analysis depth: critical, balanced, or complete
    #[arg(short, long, default_value = "balanced")]
    depth: String,

    /// Ignore any cached repository snapshot
    #[arg(long)]
    no_cache: bool,

    /// User identifier recorded on usage rows
    #[arg(long, default_value = "local")]
    user: String,

    /// Project display name (defaults to the repository name)
    #[arg(long)]
    name: Option<String>,
}

fn parse_types(raw: &[String]) -> anyhow::Result<Vec<AnalysisType>> {
    if raw.iter().any(|t| t == "all") {
        return Ok(AnalysisType::ALL.to_vec());
    }
    raw.iter()
        .map(|t| AnalysisType::from_str(t.trim()).map_err(Into::into))
        .collect()
}

fn default_name(github_url: &str) -> String {
    github_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("project")
        .trim_end_matches(".git")
        .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let types = parse_types(&cli.types)?;
    let depth = DepthLevel::from_str(&cli.depth)?;

    let config = Config::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let app = build_app(&config);
    let started = app
        .runner
        .start(StartAnalysisRequest {
            user_id: cli.user,
            project_name: cli
                .name
                .unwrap_or_else(|| default_name(&cli.github_url)),
            github_url: cli.github_url,
            analysis_types: types.clone(),
            depth,
            use_cache: !cli.no_cache,
            existing_project_id: None,
        })
        .await?;

    tracing::info!(project_id = %started.project_id, "Analysis started");

    let mut poller = StatusPoller::new(Arc::new(SystemClock), PollerConfig::default());
    let poll_interval = config.analysis.poll_interval();
    let total = types.len() as u32;

    loop {
        tokio::time::sleep(poll_interval).await;

        let project = app.projects.get(started.project_id).await?;
        let completed = app.analyses.list_for_project(started.project_id).await?.len() as u32;

        match poller.observe(PollObservation {
            status: project.analysis_status,
            completed,
            total,
        }) {
            PollDirective::Continue { progress } => {
                tracing::info!(progress, completed, total, "Analysis in progress");
            }
            PollDirective::ClearGuard { progress } => {
                tracing::warn!(progress, "Run looks stalled, clearing client guard");
            }
            PollDirective::Finished => break,
            PollDirective::Failed => {
                let message = project
                    .error_message
                    .unwrap_or_else(|| "Unknown failure".to_string());
                anyhow::bail!("Analysis failed: {}", message);
            }
            PollDirective::TimedOut => {
                anyhow::bail!("Analysis exceeded the maximum allowed duration");
            }
        }
    }

    let analyses = app.analyses.list_for_project(started.project_id).await?;
    let usage = app.usage.list_for_project(started.project_id).await?;
    let total_tokens: u64 = usage.iter().map(|r| u64::from(r.tokens_estimated)).sum();
    let total_cost: f64 = usage.iter().map(|r| r.cost_estimated).sum();

    for analysis in &analyses {
        println!("\n===== {} =====\n", analysis.analysis_type);
        println!("{}", analysis.content);
    }
    tracing::info!(
        reports = analyses.len(),
        total_tokens,
        total_cost,
        "Analysis completed"
    );

    Ok(())
}
