//! Status workflow
//!
//! Single write path for the project status state machine. Every status
//! change a run makes goes through [`AnalysisWorkflow::transition`], which
//! validates the move against the current persisted state before writing.
//! Cancellation is the one sanctioned bypass and has its own entry point.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::value_objects::{AnalysisStatus, TransitionError};
use crate::infrastructure::store::{ProjectStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated writer for project analysis status.
pub struct AnalysisWorkflow {
    projects: Arc<dyn ProjectStore>,
}

impl AnalysisWorkflow {
    pub fn new(projects: Arc<dyn ProjectStore>) -> Self {
        Self { projects }
    }

    /// Move the project to `target`, validating against the persisted
    /// current status. `error_message` replaces the stored message
    /// wholesale (pass `None` to clear it).
    pub async fn transition(
        &self,
        project_id: Uuid,
        target: AnalysisStatus,
        error_message: Option<String>,
    ) -> Result<(), WorkflowError> {
        let project = self.projects.get(project_id).await?;
        let current = project.analysis_status;

        if !current.can_transition_to(&target) {
            return Err(TransitionError {
                from: current,
                to: target,
            }
            .into());
        }

        info!(
            project_id = %project_id,
            from = %current,
            to = %target,
            "Status transition"
        );
        self.projects
            .set_status(project_id, target, error_message)
            .await?;
        Ok(())
    }

    /// Force the project straight to a terminal status, skipping
    /// validation.
    ///
    /// Cancellation settles the project regardless of which state the run
    /// was in, so it cannot go through `transition`. `target` must be
    /// terminal; anything else is a programming error and is rejected as
    /// an invalid transition.
    pub async fn force_settle(
        &self,
        project_id: Uuid,
        target: AnalysisStatus,
        error_message: Option<String>,
    ) -> Result<(), WorkflowError> {
        let project = self.projects.get(project_id).await?;
        if !target.is_terminal() {
            return Err(TransitionError {
                from: project.analysis_status,
                to: target,
            }
            .into());
        }
        info!(
            project_id = %project_id,
            from = %project.analysis_status,
            to = %target,
            "Forcing terminal status on cancellation"
        );
        self.projects
            .set_status(project_id, target, error_message)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Project;
    use crate::domain::value_objects::AnalysisType;
    use crate::infrastructure::store::InMemoryProjectStore;

    async fn seeded() -> (AnalysisWorkflow, Arc<InMemoryProjectStore>, Uuid) {
        let store = Arc::new(InMemoryProjectStore::new());
        let project = store
            .upsert(Project::new("u1", "acme", "https://github.com/acme/app"))
            .await
            .unwrap();
        (AnalysisWorkflow::new(store.clone()), store, project.id)
    }

    #[tokio::test]
    async fn test_valid_sequence_persists() {
        let (workflow, store, id) = seeded().await;

        workflow
            .transition(id, AnalysisStatus::Extracting, None)
            .await
            .unwrap();
        workflow
            .transition(id, AnalysisStatus::Generating(AnalysisType::Prd), None)
            .await
            .unwrap();
        workflow
            .transition(id, AnalysisStatus::Completed, None)
            .await
            .unwrap();

        let project = store.get(id).await.unwrap();
        assert_eq!(project.analysis_status, AnalysisStatus::Completed);
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected_and_not_persisted() {
        let (workflow, store, id) = seeded().await;

        workflow
            .transition(id, AnalysisStatus::Completed, None)
            .await
            .unwrap();
        let result = workflow
            .transition(id, AnalysisStatus::Extracting, None)
            .await;
        assert!(matches!(result, Err(WorkflowError::InvalidTransition(_))));

        let project = store.get(id).await.unwrap();
        assert_eq!(project.analysis_status, AnalysisStatus::Completed);
    }

    #[tokio::test]
    async fn test_error_transition_carries_message() {
        let (workflow, store, id) = seeded().await;

        workflow
            .transition(id, AnalysisStatus::Extracting, None)
            .await
            .unwrap();
        workflow
            .transition(
                id,
                AnalysisStatus::Error,
                Some("Repository not found".into()),
            )
            .await
            .unwrap();

        let project = store.get(id).await.unwrap();
        assert_eq!(project.analysis_status, AnalysisStatus::Error);
        assert_eq!(
            project.error_message.as_deref(),
            Some("Repository not found")
        );
    }

    #[tokio::test]
    async fn test_force_settle_skips_validation() {
        let (workflow, store, id) = seeded().await;

        workflow
            .transition(id, AnalysisStatus::Extracting, None)
            .await
            .unwrap();
        // extracting -> completed is not a move `transition` would allow
        workflow
            .force_settle(id, AnalysisStatus::Completed, None)
            .await
            .unwrap();

        let project = store.get(id).await.unwrap();
        assert_eq!(project.analysis_status, AnalysisStatus::Completed);
    }

    #[tokio::test]
    async fn test_force_settle_rejects_non_terminal_target() {
        let (workflow, store, id) = seeded().await;

        let result = workflow
            .force_settle(id, AnalysisStatus::Extracting, None)
            .await;
        assert!(matches!(result, Err(WorkflowError::InvalidTransition(_))));

        let project = store.get(id).await.unwrap();
        assert_eq!(project.analysis_status, AnalysisStatus::Pending);
    }
}
