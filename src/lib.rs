//! RepoLens — repository analysis report pipeline.
//!
//! This is the binary crate that wires the member crates together: config
//! and logging from `repolens-core`, the gateway client from
//! `repolens-llm`, and the orchestration core from
//! `repolens-orchestrator`.

mod app;

pub use app::{AppHandle, build_app};
pub use repolens_core::{Config, init_tracing};

// Re-export for convenience
pub use repolens_core;
pub use repolens_llm;
pub use repolens_orchestrator;
