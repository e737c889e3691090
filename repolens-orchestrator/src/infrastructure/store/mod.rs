//! Storage traits for projects, analyses, usage, queue items, and leases
//!
//! The orchestrator only ever talks to these traits; [`memory`] provides
//! the default in-process backend. A database-backed implementation plugs
//! in without touching the application layer.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Analysis, AnalysisLease, Project, QueueItem, UsageRecord};
use crate::domain::snapshot::RepoSnapshot;
use crate::domain::value_objects::{AnalysisStatus, QueueItemStatus};

pub use memory::{
    InMemoryAnalysisStore, InMemoryLeaseStore, InMemoryProjectStore, InMemoryQueueStore,
    InMemoryUsageStore,
};

/// Errors from any store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Project persistence keyed by `(github_url, user_id)`.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert or return the existing project for the same
    /// `(github_url, user_id)` pair. Name and URL of an existing row are
    /// left untouched; its status is not reset here.
    async fn upsert(&self, project: Project) -> Result<Project, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Project, StoreError>;

    /// Persist a status change, replacing the error message wholesale.
    async fn set_status(
        &self,
        id: Uuid,
        status: AnalysisStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError>;

    /// Persist a freshly extracted snapshot for later cache hits.
    async fn write_snapshot(&self, id: Uuid, snapshot: RepoSnapshot) -> Result<(), StoreError>;
}

/// Append-only report storage.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert(&self, analysis: Analysis) -> Result<(), StoreError>;
    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Analysis>, StoreError>;
}

/// Append-only usage accounting.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn append(&self, record: UsageRecord) -> Result<(), StoreError>;
    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<UsageRecord>, StoreError>;
}

/// Per-type work items for the externally-driven path.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn create_items(&self, items: Vec<QueueItem>) -> Result<(), StoreError>;

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<QueueItem>, StoreError>;

    async fn set_status(
        &self,
        item_id: Uuid,
        status: QueueItemStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError>;

    /// Oldest pending item for the project, if any.
    async fn next_pending(&self, project_id: Uuid) -> Result<Option<QueueItem>, StoreError>;

    /// Remove all still-pending items; returns how many were removed.
    async fn delete_pending(&self, project_id: Uuid) -> Result<usize, StoreError>;
}

/// Advisory single-flight lease per project.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Acquire the project lease for `ttl_seconds`. Fails with
    /// [`StoreError::Conflict`] while a non-expired lease is held by
    /// someone else; expired leases are silently reclaimed.
    async fn acquire(&self, project_id: Uuid, ttl_seconds: u64)
        -> Result<AnalysisLease, StoreError>;

    /// Release the lease if `token` still owns it. Releasing a lease that
    /// was already reclaimed is not an error.
    async fn release(&self, project_id: Uuid, token: Uuid) -> Result<(), StoreError>;
}
