//! RepoLens core — shared configuration and logging.
//!
//! - [`config`] — Layered configuration (files + `REPOLENS__*` environment
//!   variables) with validation
//! - [`logging`] — Structured logging with tracing
//!
//! # Example
//!
//! ```rust,ignore
//! use repolens_core::{Config, init_tracing};
//!
//! let config = Config::load()?;
//! init_tracing(&config.logging)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{AnalysisConfig, Config, ConfigError, GithubConfig, LlmConfig, LoggingConfig};
pub use config::validation::{Validate, ValidationError};
pub use logging::init_tracing;
