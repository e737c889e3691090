//! Orchestrator infrastructure: GitHub access, storage, runtime config,
//! builtin prompts

pub mod config_provider;
pub mod github;
pub mod prompts;
pub mod store;
