//! In-memory workflow store

use super::models::{Workflow, WorkflowStatus};
use super::WorkflowError;
use crate::events::{EventEmitter, WorkflowAction, WorkflowEvent};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Workflows keyed by id, shared across request handlers.
///
/// Every mutation emits a `WorkflowEvent` after the write lock is released.
pub struct WorkflowStore {
    workflows: RwLock<HashMap<String, Workflow>>,
    emitter: Option<Arc<dyn EventEmitter>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            emitter: None,
        }
    }

    pub fn with_emitter(emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            emitter: Some(emitter),
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(ref emitter) = self.emitter {
            emitter.emit(event);
        }
    }

    /// Insert a new workflow. An empty id is replaced by a fresh UUID.
    pub async fn create(&self, mut workflow: Workflow) -> Result<Workflow, WorkflowError> {
        if workflow.id.is_empty() {
            workflow.id = Uuid::new_v4().to_string();
        }

        {
            let mut workflows = self.workflows.write().await;
            if workflows.contains_key(&workflow.id) {
                return Err(WorkflowError::AlreadyExists(workflow.id));
            }
            workflows.insert(workflow.id.clone(), workflow.clone());
        }

        tracing::info!(workflow_id = %workflow.id, name = %workflow.name, "Workflow created");
        self.emit(
            WorkflowEvent::new(WorkflowAction::Created, &workflow.id)
                .with_payload(serde_json::json!({ "name": workflow.name })),
        );
        Ok(workflow)
    }

    pub async fn get(&self, id: &str) -> Option<Workflow> {
        self.workflows.read().await.get(id).cloned()
    }

    /// All workflows, newest first
    pub async fn list(&self) -> Vec<Workflow> {
        let mut all: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        all
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: WorkflowStatus,
    ) -> Result<Workflow, WorkflowError> {
        let updated = {
            let mut workflows = self.workflows.write().await;
            let wf = workflows
                .get_mut(id)
                .ok_or_else(|| WorkflowError::NotFound(id.to_string()))?;
            wf.status = status;
            wf.updated_at = Some(Utc::now());
            wf.clone()
        };

        tracing::debug!(workflow_id = %id, status = ?status, "Workflow status updated");
        self.emit(
            WorkflowEvent::new(WorkflowAction::Updated, id)
                .with_payload(serde_json::json!({ "status": status })),
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), WorkflowError> {
        let removed = self.workflows.write().await.remove(id);
        if removed.is_none() {
            return Err(WorkflowError::NotFound(id.to_string()));
        }
        tracing::info!(workflow_id = %id, "Workflow deleted");
        self.emit(WorkflowEvent::new(WorkflowAction::Deleted, id));
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}
