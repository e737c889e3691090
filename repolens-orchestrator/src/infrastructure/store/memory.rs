//! In-process store implementations backed by `RwLock<HashMap>`
//!
//! Default backend for the CLI and the test suites. Lock scopes are kept
//! short; no lock is held across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{Analysis, AnalysisLease, Project, QueueItem, UsageRecord};
use crate::domain::snapshot::RepoSnapshot;
use crate::domain::value_objects::{AnalysisStatus, QueueItemStatus};

use super::{
    AnalysisStore, LeaseStore, ProjectStore, QueueStore, StoreError, UsageStore,
};

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{} lock poisoned", what))
}

// ── Projects ──

#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<Uuid, Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn upsert(&self, project: Project) -> Result<Project, StoreError> {
        let mut projects = self.projects.write().map_err(|_| poisoned("projects"))?;

        if let Some(existing) = projects
            .values()
            .find(|p| p.github_url == project.github_url && p.user_id == project.user_id)
        {
            return Ok(existing.clone());
        }

        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> Result<Project, StoreError> {
        let projects = self.projects.read().map_err(|_| poisoned("projects"))?;
        projects
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("project {}", id)))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AnalysisStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        let mut projects = self.projects.write().map_err(|_| poisoned("projects"))?;
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("project {}", id)))?;
        project.analysis_status = status;
        project.error_message = error_message;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn write_snapshot(&self, id: Uuid, snapshot: RepoSnapshot) -> Result<(), StoreError> {
        let mut projects = self.projects.write().map_err(|_| poisoned("projects"))?;
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("project {}", id)))?;
        project.github_data = Some(snapshot);
        project.updated_at = Utc::now();
        Ok(())
    }
}

// ── Analyses ──

#[derive(Default)]
pub struct InMemoryAnalysisStore {
    analyses: RwLock<Vec<Analysis>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn insert(&self, analysis: Analysis) -> Result<(), StoreError> {
        let mut analyses = self.analyses.write().map_err(|_| poisoned("analyses"))?;
        analyses.push(analysis);
        Ok(())
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Analysis>, StoreError> {
        let analyses = self.analyses.read().map_err(|_| poisoned("analyses"))?;
        Ok(analyses
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }
}

// ── Usage ──

#[derive(Default)]
pub struct InMemoryUsageStore {
    records: RwLock<Vec<UsageRecord>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn append(&self, record: UsageRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned("usage"))?;
        records.push(record);
        Ok(())
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<UsageRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("usage"))?;
        Ok(records
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }
}

// ── Queue ──

#[derive(Default)]
pub struct InMemoryQueueStore {
    items: RwLock<Vec<QueueItem>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn create_items(&self, new_items: Vec<QueueItem>) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned("queue"))?;
        items.extend(new_items);
        Ok(())
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<QueueItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned("queue"))?;
        Ok(items
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn set_status(
        &self,
        item_id: Uuid,
        status: QueueItemStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned("queue"))?;
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::NotFound(format!("queue item {}", item_id)))?;
        item.status = status;
        item.error_message = error_message;
        Ok(())
    }

    async fn next_pending(&self, project_id: Uuid) -> Result<Option<QueueItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned("queue"))?;
        Ok(items
            .iter()
            .filter(|i| i.project_id == project_id && i.status == QueueItemStatus::Pending)
            .min_by_key(|i| i.created_at)
            .cloned())
    }

    async fn delete_pending(&self, project_id: Uuid) -> Result<usize, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned("queue"))?;
        let before = items.len();
        items.retain(|i| !(i.project_id == project_id && i.status == QueueItemStatus::Pending));
        Ok(before - items.len())
    }
}

// ── Leases ──

#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: RwLock<HashMap<Uuid, AnalysisLease>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn acquire(
        &self,
        project_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<AnalysisLease, StoreError> {
        let mut leases = self.leases.write().map_err(|_| poisoned("leases"))?;
        let now = Utc::now();

        if let Some(existing) = leases.get(&project_id) {
            if !existing.is_expired(now) {
                return Err(StoreError::Conflict(format!(
                    "project {} already leased",
                    project_id
                )));
            }
        }

        let lease = AnalysisLease {
            project_id,
            lease_token: Uuid::new_v4(),
            expires_at: now + chrono::Duration::seconds(ttl_seconds as i64),
        };
        leases.insert(project_id, lease.clone());
        Ok(lease)
    }

    async fn release(&self, project_id: Uuid, token: Uuid) -> Result<(), StoreError> {
        let mut leases = self.leases.write().map_err(|_| poisoned("leases"))?;
        if let Some(lease) = leases.get(&project_id) {
            if lease.lease_token == token {
                leases.remove(&project_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_project_upsert_is_keyed_by_url_and_user() {
        let store = InMemoryProjectStore::new();

        let first = store
            .upsert(Project::new("u1", "acme", "https://github.com/acme/app"))
            .await
            .unwrap();
        let second = store
            .upsert(Project::new("u1", "renamed", "https://github.com/acme/app"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "acme");

        let other_user = store
            .upsert(Project::new("u2", "acme", "https://github.com/acme/app"))
            .await
            .unwrap();
        assert_ne!(first.id, other_user.id);
    }

    #[tokio::test]
    async fn test_set_status_replaces_error_message() {
        let store = InMemoryProjectStore::new();
        let project = store
            .upsert(Project::new("u1", "acme", "https://github.com/acme/app"))
            .await
            .unwrap();

        store
            .set_status(project.id, AnalysisStatus::Error, Some("boom".into()))
            .await
            .unwrap();
        let read = store.get(project.id).await.unwrap();
        assert_eq!(read.analysis_status, AnalysisStatus::Error);
        assert_eq!(read.error_message.as_deref(), Some("boom"));

        store
            .set_status(project.id, AnalysisStatus::Pending, None)
            .await
            .unwrap();
        let read = store.get(project.id).await.unwrap();
        assert!(read.error_message.is_none());
    }

    #[tokio::test]
    async fn test_queue_next_pending_is_oldest() {
        let store = InMemoryQueueStore::new();
        let project_id = Uuid::new_v4();

        let mut older = QueueItem::new(project_id, crate::domain::value_objects::AnalysisType::Prd);
        older.created_at = Utc::now() - chrono::Duration::seconds(10);
        let newer = QueueItem::new(
            project_id,
            crate::domain::value_objects::AnalysisType::Security,
        );
        store
            .create_items(vec![newer.clone(), older.clone()])
            .await
            .unwrap();

        let next = store.next_pending(project_id).await.unwrap().unwrap();
        assert_eq!(next.id, older.id);

        store
            .set_status(older.id, QueueItemStatus::Completed, None)
            .await
            .unwrap();
        let next = store.next_pending(project_id).await.unwrap().unwrap();
        assert_eq!(next.id, newer.id);
    }

    #[tokio::test]
    async fn test_delete_pending_spares_processed_items() {
        let store = InMemoryQueueStore::new();
        let project_id = Uuid::new_v4();
        let done = QueueItem::new(project_id, crate::domain::value_objects::AnalysisType::Prd);
        let pending = QueueItem::new(
            project_id,
            crate::domain::value_objects::AnalysisType::Roadmap,
        );
        store
            .create_items(vec![done.clone(), pending])
            .await
            .unwrap();
        store
            .set_status(done.id, QueueItemStatus::Completed, None)
            .await
            .unwrap();

        let removed = store.delete_pending(project_id).await.unwrap();
        assert_eq!(removed, 1);
        let left = store.list_for_project(project_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, done.id);
    }

    #[tokio::test]
    async fn test_lease_single_flight_and_expiry() {
        let store = InMemoryLeaseStore::new();
        let project_id = Uuid::new_v4();

        let lease = store.acquire(project_id, 900).await.unwrap();
        assert!(matches!(
            store.acquire(project_id, 900).await,
            Err(StoreError::Conflict(_))
        ));

        // Stale token cannot release a reclaimed lease
        store.release(project_id, lease.lease_token).await.unwrap();
        let lease2 = store.acquire(project_id, 0).await.unwrap();
        // ttl 0 expires immediately, so a new acquire reclaims it
        let lease3 = store.acquire(project_id, 900).await.unwrap();
        assert_ne!(lease2.lease_token, lease3.lease_token);

        store.release(project_id, lease2.lease_token).await.unwrap();
        assert!(matches!(
            store.acquire(project_id, 900).await,
            Err(StoreError::Conflict(_))
        ));
    }
}
