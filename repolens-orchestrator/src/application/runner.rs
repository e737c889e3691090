//! Analysis runner
//!
//! Owns the full lifecycle of an analysis run. `start` validates the
//! request, acquires the project lease, and detaches the run as a
//! background task; the task extracts (or reuses) the repository
//! snapshot, then generates one report per requested type, persisting
//! each as it lands. Failed types are skipped and the run still settles
//! `completed`; only failures before generation begins (credentials,
//! extraction) settle `error` with a human-readable message.
//!
//! The queue path is a separate entry: `enqueue` materializes per-type
//! work items and parks the project in `queue_ready`; an external driver
//! calls `process_next` once per item.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use repolens_llm::LlmInvoker;

use crate::domain::entities::{Analysis, Project, QueueItem, UsageRecord};
use crate::domain::snapshot::{truncate_chars, RepoSnapshot};
use crate::domain::value_objects::{
    AnalysisStatus, AnalysisType, DepthLevel, QueueItemStatus,
};
use crate::infrastructure::github::extractor::parse_github_url;
use crate::infrastructure::github::{ExtractError, SnapshotExtractor};
use crate::infrastructure::store::{
    AnalysisStore, LeaseStore, ProjectStore, QueueStore, StoreError, UsageStore,
};

use super::depth::{DepthResolver, DepthSettings};
use super::prompts::{PromptResolver, PromptVars};
use super::workflow::{AnalysisWorkflow, WorkflowError};

/// A request to analyze one repository.
#[derive(Debug, Clone)]
pub struct StartAnalysisRequest {
    pub user_id: String,
    pub project_name: String,
    pub github_url: String,
    pub analysis_types: Vec<AnalysisType>,
    pub depth: DepthLevel,
    /// Reuse a previously persisted snapshot when available
    pub use_cache: bool,
    /// Re-run against a known project instead of upserting by
    /// `(github_url, user_id)`. The project must exist.
    pub existing_project_id: Option<Uuid>,
}

/// Errors surfaced synchronously by `start` / `enqueue`.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("At least one analysis type is required")]
    EmptyRequest,
    #[error("Not a valid GitHub repository URL: {0}")]
    InvalidUrl(String),
    #[error("An analysis is already in progress for this project")]
    AlreadyInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Errors from the queue-processing entry point.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Project has no cached repository snapshot")]
    MissingSnapshot,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Handle returned by `start`; the run itself is detached.
pub struct StartedAnalysis {
    pub project_id: Uuid,
    pub handle: JoinHandle<()>,
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelOutcome {
    /// Pending queue items removed
    pub deleted_pending: usize,
    pub final_status: AnalysisStatus,
}

/// Static knobs for the runner, derived from file config at wiring time.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Whether the LLM gateway has credentials; checked at run time so a
    /// misconfigured deployment produces readable error statuses
    pub credentials_present: bool,
    /// Pause between successive report generations
    pub inter_call_delay: Duration,
    pub lease_ttl_seconds: u64,
    /// Model id of the standard (non-economical) tier, for cost tiering
    pub standard_model: String,
    pub economical_cost_per_1k_tokens: f64,
    pub standard_cost_per_1k_tokens: f64,
}

impl RunnerConfig {
    /// Derive the runner knobs from the file configuration.
    pub fn from_config(config: &repolens_core::config::Config) -> Self {
        Self {
            credentials_present: config.llm.has_credentials(),
            inter_call_delay: config.analysis.inter_call_delay(),
            lease_ttl_seconds: config.analysis.lease_ttl_seconds,
            standard_model: config.llm.standard_model.clone(),
            economical_cost_per_1k_tokens: config.llm.economical_cost_per_1k_tokens,
            standard_cost_per_1k_tokens: config.llm.standard_cost_per_1k_tokens,
        }
    }
}

pub struct AnalysisRunner {
    projects: Arc<dyn ProjectStore>,
    analyses: Arc<dyn AnalysisStore>,
    usage: Arc<dyn UsageStore>,
    queue: Arc<dyn QueueStore>,
    leases: Arc<dyn LeaseStore>,
    workflow: AnalysisWorkflow,
    extractor: Arc<SnapshotExtractor>,
    invoker: Arc<LlmInvoker>,
    depth_resolver: Arc<DepthResolver>,
    prompt_resolver: Arc<PromptResolver>,
    config: RunnerConfig,
}

impl AnalysisRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        analyses: Arc<dyn AnalysisStore>,
        usage: Arc<dyn UsageStore>,
        queue: Arc<dyn QueueStore>,
        leases: Arc<dyn LeaseStore>,
        extractor: Arc<SnapshotExtractor>,
        invoker: Arc<LlmInvoker>,
        depth_resolver: Arc<DepthResolver>,
        prompt_resolver: Arc<PromptResolver>,
        config: RunnerConfig,
    ) -> Self {
        let workflow = AnalysisWorkflow::new(projects.clone());
        Self {
            projects,
            analyses,
            usage,
            queue,
            leases,
            workflow,
            extractor,
            invoker,
            depth_resolver,
            prompt_resolver,
            config,
        }
    }

    // ── Monolithic path ──

    /// Validate the request, claim the project, and detach the run.
    pub async fn start(
        self: &Arc<Self>,
        request: StartAnalysisRequest,
    ) -> Result<StartedAnalysis, StartError> {
        let types = dedup_types(&request.analysis_types);
        if types.is_empty() {
            return Err(StartError::EmptyRequest);
        }
        let (owner, repo) = parse_github_url(&request.github_url)
            .ok_or_else(|| StartError::InvalidUrl(request.github_url.clone()))?;

        let project = match request.existing_project_id {
            Some(id) => self.projects.get(id).await?,
            None => {
                self.projects
                    .upsert(Project::new(
                        &request.user_id,
                        &request.project_name,
                        &request.github_url,
                    ))
                    .await?
            }
        };

        // Fast reject before touching the lease; the lease remains the
        // authoritative single-flight guard.
        if matches!(
            project.analysis_status,
            AnalysisStatus::Extracting
                | AnalysisStatus::Generating(_)
                | AnalysisStatus::QueueReady
        ) {
            return Err(StartError::AlreadyInProgress);
        }

        let lease = self
            .leases
            .acquire(project.id, self.config.lease_ttl_seconds)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => StartError::AlreadyInProgress,
                other => StartError::Store(other),
            })?;

        if project.analysis_status.is_terminal() {
            self.workflow
                .transition(project.id, AnalysisStatus::Pending, None)
                .await?;
        }

        info!(
            project_id = %project.id,
            repository = %format!("{}/{}", owner, repo),
            types = types.len(),
            depth = %request.depth,
            "Analysis accepted"
        );

        let runner = Arc::clone(self);
        let project_id = project.id;
        let lease_token = lease.lease_token;
        let handle = tokio::spawn(async move {
            runner
                .run(project_id, owner, repo, request, types, lease_token)
                .await;
        });

        Ok(StartedAnalysis { project_id, handle })
    }

    /// The detached run body. Never panics the task; every failure path
    /// settles the status and releases the lease.
    async fn run(
        &self,
        project_id: Uuid,
        owner: String,
        repo: String,
        request: StartAnalysisRequest,
        types: Vec<AnalysisType>,
        lease_token: Uuid,
    ) {
        let settings = self.depth_resolver.resolve(request.depth).await;

        if !self.config.credentials_present {
            self.settle_error(project_id, "LLM gateway credentials are not configured")
                .await;
            self.release(project_id, lease_token).await;
            return;
        }

        let snapshot = match self
            .obtain_snapshot(project_id, &owner, &repo, &request)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(message) => {
                self.settle_error(project_id, &message).await;
                self.release(project_id, lease_token).await;
                return;
            }
        };

        let vars = self.prompt_vars(&request, &snapshot, &settings);

        let mut generated = 0usize;
        for (index, analysis_type) in types.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.inter_call_delay).await;
            }

            // A cancel settles the status underneath the run; stop
            // without overwriting it.
            match self.projects.get(project_id).await {
                Ok(p) if p.analysis_status.is_terminal() => {
                    info!(project_id = %project_id, "Run stopped by cancellation");
                    self.release(project_id, lease_token).await;
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(project_id = %project_id, error = %e, "Project vanished mid-run");
                    self.release(project_id, lease_token).await;
                    return;
                }
            }

            if let Err(e) = self
                .workflow
                .transition(project_id, AnalysisStatus::Generating(*analysis_type), None)
                .await
            {
                warn!(project_id = %project_id, error = %e, "Could not enter generating state");
                self.release(project_id, lease_token).await;
                return;
            }

            match self
                .generate_one(project_id, &request.user_id, *analysis_type, &settings, &vars, request.depth)
                .await
            {
                Ok(()) => generated += 1,
                Err(e) => {
                    // One failed type does not fail the run.
                    warn!(
                        project_id = %project_id,
                        analysis_type = %analysis_type,
                        error = %e,
                        "Report generation failed, continuing with remaining types"
                    );
                }
            }
        }

        // Per-type failures are recoverable: once every requested type has
        // been attempted the run settles to `completed`, even when no
        // report landed. The reports that failed are simply absent and can
        // be re-requested.
        if generated == 0 {
            warn!(
                project_id = %project_id,
                requested = types.len(),
                "No report generation succeeded"
            );
        }
        if let Err(e) = self
            .workflow
            .transition(project_id, AnalysisStatus::Completed, None)
            .await
        {
            warn!(project_id = %project_id, error = %e, "Could not settle completed status");
        }
        info!(
            project_id = %project_id,
            generated,
            requested = types.len(),
            "Analysis run completed"
        );

        self.release(project_id, lease_token).await;
    }

    /// Cached snapshot when allowed, fresh extraction otherwise. Fresh
    /// snapshots are persisted before any generation starts.
    async fn obtain_snapshot(
        &self,
        project_id: Uuid,
        owner: &str,
        repo: &str,
        request: &StartAnalysisRequest,
    ) -> Result<RepoSnapshot, String> {
        if request.use_cache {
            match self.projects.get(project_id).await {
                Ok(project) => {
                    if let Some(snapshot) = project.github_data {
                        info!(project_id = %project_id, "Using cached repository snapshot");
                        return Ok(snapshot);
                    }
                }
                Err(e) => return Err(format!("Project lookup failed: {}", e)),
            }
        }

        if let Err(e) = self
            .workflow
            .transition(project_id, AnalysisStatus::Extracting, None)
            .await
        {
            return Err(format!("Could not enter extracting state: {}", e));
        }

        let extraction = self
            .extractor
            .extract(owner, repo, &request.project_name)
            .await
            .map_err(|e| match e {
                ExtractError::RepositoryNotFound(detail) => {
                    format!("Repository not found or unreachable: {}", detail)
                }
            })?;

        if let Err(e) = self
            .projects
            .write_snapshot(project_id, extraction.snapshot.clone())
            .await
        {
            warn!(project_id = %project_id, error = %e, "Snapshot cache write failed");
        }

        Ok(extraction.snapshot)
    }

    fn prompt_vars(
        &self,
        request: &StartAnalysisRequest,
        snapshot: &RepoSnapshot,
        settings: &DepthSettings,
    ) -> PromptVars {
        let context = truncate_chars(&snapshot.to_context(), settings.max_context_chars);
        PromptVars {
            project_name: request.project_name.clone(),
            github_url: request.github_url.clone(),
            readme: snapshot.readme.clone().unwrap_or_default(),
            structure: snapshot.file_tree.join("\n"),
            dependencies: snapshot.dependency_list(),
            source_code: context,
        }
    }

    /// One LLM call plus its persistence: report row and usage row.
    async fn generate_one(
        &self,
        project_id: Uuid,
        user_id: &str,
        analysis_type: AnalysisType,
        settings: &DepthSettings,
        vars: &PromptVars,
        depth: DepthLevel,
    ) -> Result<(), String> {
        let prompts = self
            .prompt_resolver
            .resolve(analysis_type, vars, settings.prompt_style)
            .await;

        let report = self
            .invoker
            .invoke(&prompts.system, &prompts.user, &settings.model)
            .await
            .map_err(|e| e.to_string())?;

        let tokens = report.tokens_used;
        let cost = self.cost_for(&report.model, tokens);

        self.analyses
            .insert(Analysis::new(project_id, analysis_type, report.content))
            .await
            .map_err(|e| e.to_string())?;

        let record = UsageRecord {
            id: Uuid::new_v4(),
            project_id,
            user_id: user_id.to_string(),
            analysis_type,
            tokens_estimated: tokens,
            cost_estimated: cost,
            model_used: report.model,
            depth_level: depth,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.usage.append(record).await {
            // Accounting must not fail an otherwise good report.
            warn!(project_id = %project_id, error = %e, "Usage record append failed");
        }

        info!(
            project_id = %project_id,
            analysis_type = %analysis_type,
            tokens,
            "Report generated"
        );
        Ok(())
    }

    fn cost_for(&self, model: &str, tokens: u32) -> f64 {
        let per_1k = if model == self.config.standard_model {
            self.config.standard_cost_per_1k_tokens
        } else {
            self.config.economical_cost_per_1k_tokens
        };
        f64::from(tokens) / 1000.0 * per_1k
    }

    async fn settle_error(&self, project_id: Uuid, message: &str) {
        if let Err(e) = self
            .workflow
            .transition(project_id, AnalysisStatus::Error, Some(message.to_string()))
            .await
        {
            warn!(project_id = %project_id, error = %e, "Could not settle error status");
        }
    }

    async fn release(&self, project_id: Uuid, token: Uuid) {
        if let Err(e) = self.leases.release(project_id, token).await {
            warn!(project_id = %project_id, error = %e, "Lease release failed");
        }
    }

    // ── Queue path ──

    /// Materialize one work item per requested type and park the project
    /// in `queue_ready`. The caller then drives `process_next` per item.
    pub async fn enqueue(
        &self,
        project_id: Uuid,
        analysis_types: &[AnalysisType],
    ) -> Result<usize, StartError> {
        let types = dedup_types(analysis_types);
        if types.is_empty() {
            return Err(StartError::EmptyRequest);
        }

        let items: Vec<QueueItem> = types
            .iter()
            .map(|t| QueueItem::new(project_id, *t))
            .collect();
        let count = items.len();
        self.queue.create_items(items).await?;
        self.workflow
            .transition(project_id, AnalysisStatus::QueueReady, None)
            .await?;

        info!(project_id = %project_id, items = count, "Queue populated");
        Ok(count)
    }

    /// Process the oldest pending queue item, if any.
    ///
    /// Requires a cached snapshot; the queue path never extracts. When
    /// the processed item was the last pending one the project settles to
    /// `completed`. Returns the processed type, or `None` on an empty
    /// queue.
    pub async fn process_next(
        &self,
        project_id: Uuid,
        depth: DepthLevel,
    ) -> Result<Option<AnalysisType>, ProcessError> {
        let Some(item) = self.queue.next_pending(project_id).await? else {
            return Ok(None);
        };

        let project = self.projects.get(project_id).await?;
        let Some(snapshot) = project.github_data else {
            self.queue
                .set_status(
                    item.id,
                    QueueItemStatus::Error,
                    Some("No cached repository snapshot".into()),
                )
                .await?;
            return Err(ProcessError::MissingSnapshot);
        };

        self.queue
            .set_status(item.id, QueueItemStatus::Processing, None)
            .await?;
        self.workflow
            .transition(
                project_id,
                AnalysisStatus::Generating(item.analysis_type),
                None,
            )
            .await?;

        let settings = self.depth_resolver.resolve(depth).await;
        let context = truncate_chars(&snapshot.to_context(), settings.max_context_chars);
        let vars = PromptVars {
            project_name: project.name.clone(),
            github_url: project.github_url.clone(),
            readme: snapshot.readme.clone().unwrap_or_default(),
            structure: snapshot.file_tree.join("\n"),
            dependencies: snapshot.dependency_list(),
            source_code: context,
        };

        match self
            .generate_one(
                project_id,
                &project.user_id,
                item.analysis_type,
                &settings,
                &vars,
                depth,
            )
            .await
        {
            Ok(()) => {
                self.queue
                    .set_status(item.id, QueueItemStatus::Completed, None)
                    .await?;
            }
            Err(message) => {
                warn!(
                    project_id = %project_id,
                    analysis_type = %item.analysis_type,
                    error = %message,
                    "Queue item failed"
                );
                self.queue
                    .set_status(item.id, QueueItemStatus::Error, Some(message))
                    .await?;
            }
        }

        if self.queue.next_pending(project_id).await?.is_none() {
            self.workflow
                .transition(project_id, AnalysisStatus::Completed, None)
                .await?;
        }

        Ok(Some(item.analysis_type))
    }

    // ── Cancellation ──

    /// Cancel whatever is in flight for the project.
    ///
    /// Pending queue items are dropped, processed work is kept. The
    /// project settles to `completed` when at least one report exists,
    /// `error` otherwise. An already-finished project is left untouched.
    pub async fn cancel(&self, project_id: Uuid) -> Result<CancelOutcome, WorkflowError> {
        let project = self.projects.get(project_id).await?;
        let deleted_pending = self.queue.delete_pending(project_id).await?;

        if project.analysis_status.is_terminal() {
            return Ok(CancelOutcome {
                deleted_pending,
                final_status: project.analysis_status,
            });
        }

        let has_reports = !self.analyses.list_for_project(project_id).await?.is_empty();
        let final_status = if has_reports {
            AnalysisStatus::Completed
        } else {
            AnalysisStatus::Error
        };
        let message = if has_reports {
            None
        } else {
            Some("Analysis cancelled before any report completed".to_string())
        };

        info!(
            project_id = %project_id,
            deleted_pending,
            final_status = %final_status,
            "Analysis cancelled"
        );
        self.workflow
            .force_settle(project_id, final_status.clone(), message)
            .await?;

        Ok(CancelOutcome {
            deleted_pending,
            final_status,
        })
    }
}

/// Preserve request order, drop duplicates.
fn dedup_types(types: &[AnalysisType]) -> Vec<AnalysisType> {
    let mut seen = Vec::with_capacity(types.len());
    for t in types {
        if !seen.contains(t) {
            seen.push(*t);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserves_order() {
        let types = [
            AnalysisType::Security,
            AnalysisType::Prd,
            AnalysisType::Security,
            AnalysisType::Prd,
        ];
        assert_eq!(
            dedup_types(&types),
            vec![AnalysisType::Security, AnalysisType::Prd]
        );
    }
}
