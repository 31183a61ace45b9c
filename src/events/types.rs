//! Workflow event types

use serde::{Deserialize, Serialize};

/// The mutation performed on a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Created,
    Updated,
    Deleted,
}

/// An event emitted after a successful workflow mutation.
///
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub action: WorkflowAction,
    pub workflow_id: String,
    /// Optional payload (e.g. new status, name)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl WorkflowEvent {
    /// Create a new event with the current timestamp
    pub fn new(action: WorkflowAction, workflow_id: impl Into<String>) -> Self {
        Self {
            action,
            workflow_id: workflow_id.into(),
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Sink for workflow events. Emitting must never block or fail the caller.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_skips_null_payload() {
        let event = WorkflowEvent::new(WorkflowAction::Deleted, "wf-1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "deleted");
        assert_eq!(json["workflow_id"], "wf-1");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_event_with_payload() {
        let event = WorkflowEvent::new(WorkflowAction::Updated, "wf-2")
            .with_payload(serde_json::json!({"status": "ready"}));
        let json = serde_json::to_string(&event).unwrap();
        let back: WorkflowEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, WorkflowAction::Updated);
        assert_eq!(back.payload["status"], "ready");
    }
}
