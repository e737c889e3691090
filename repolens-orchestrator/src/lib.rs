//! RepoLens orchestrator — the analysis orchestration core.
//!
//! Given a GitHub repository reference, this crate extracts a bounded
//! textual snapshot, resolves a depth tier into model/context settings,
//! and drives one LLM call per requested report type as a detached
//! background run with a persisted status state machine, or alternatively
//! as an externally-driven queue of per-type work items.
//!
//! Layers follow the usual split:
//! - [`domain`] — entities, value objects, and the repository snapshot
//! - [`application`] — depth/prompt resolution, workflow, runner, queue
//!   path, and the client-side status poller
//! - [`infrastructure`] — GitHub client/extractor, storage traits with
//!   in-memory implementations, runtime config provider, builtin prompts

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::poller::{
    Clock, PollDirective, PollObservation, PollerConfig, StatusPoller, SystemClock,
};
pub use application::runner::{
    AnalysisRunner, CancelOutcome, ProcessError, RunnerConfig, StartAnalysisRequest, StartError,
    StartedAnalysis,
};
pub use application::workflow::{AnalysisWorkflow, WorkflowError};
pub use domain::entities::{Analysis, AnalysisLease, Project, QueueItem, UsageRecord};
pub use domain::snapshot::RepoSnapshot;
pub use domain::value_objects::{
    AnalysisStatus, AnalysisType, DepthLevel, PromptStyle, QueueItemStatus,
};
