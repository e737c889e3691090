//! Orchestrator application layer: resolvers, workflow, runner, poller

pub mod depth;
pub mod poller;
pub mod prompts;
pub mod runner;
pub mod workflow;

pub use depth::{DepthResolver, DepthSettings};
pub use poller::{Clock, PollDirective, PollObservation, PollerConfig, StatusPoller, SystemClock};
pub use prompts::{PromptResolver, PromptVars, ResolvedPrompts};
pub use runner::{
    AnalysisRunner, CancelOutcome, ProcessError, RunnerConfig, StartAnalysisRequest, StartError,
    StartedAnalysis,
};
pub use workflow::{AnalysisWorkflow, WorkflowError};
