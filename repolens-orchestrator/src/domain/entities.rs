//! Orchestrator domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::snapshot::RepoSnapshot;
use super::value_objects::{AnalysisStatus, AnalysisType, DepthLevel, QueueItemStatus};

/// One (repository URL, user) pair and its analysis state machine.
///
/// At most one project exists per `(github_url, user_id)`; the store
/// enforces this with upsert-on-conflict semantics. The status field is
/// written only by the workflow and the cancellation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub github_url: String,
    pub analysis_status: AnalysisStatus,
    pub error_message: Option<String>,
    /// Cached snapshot; written after every fresh extraction
    pub github_data: Option<RepoSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, github_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            github_url: github_url.into(),
            analysis_status: AnalysisStatus::Pending,
            error_message: None,
            github_data: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One generated report. Multiple rows per (project, type) are expected;
/// the most recent `created_at` wins for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub project_id: Uuid,
    pub analysis_type: AnalysisType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(project_id: Uuid, analysis_type: AnalysisType, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            analysis_type,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Append-only accounting row for one completed LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: String,
    pub analysis_type: AnalysisType,
    pub tokens_estimated: u32,
    pub cost_estimated: f64,
    pub model_used: String,
    pub depth_level: DepthLevel,
    pub created_at: DateTime<Utc>,
}

/// Per-type unit of work on the externally-driven queue path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub analysis_type: AnalysisType,
    pub status: QueueItemStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(project_id: Uuid, analysis_type: AnalysisType) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            analysis_type,
            status: QueueItemStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

/// Advisory single-flight lease: at most one active run per project.
///
/// Acquired before the run leaves `pending`, released on terminal
/// transition. Expired leases are reclaimable so a crashed run cannot
/// block a project forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisLease {
    pub project_id: Uuid,
    pub lease_token: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AnalysisLease {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
