//! Orchestrator domain layer

pub mod entities;
pub mod snapshot;
pub mod value_objects;
