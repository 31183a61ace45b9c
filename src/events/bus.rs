//! Event bus for broadcasting workflow events

use super::{EventEmitter, WorkflowEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Event bus that distributes `WorkflowEvent`s via `tokio::sync::broadcast`
///
/// Fire-and-forget: if no subscribers are connected, events are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: WorkflowEvent) {
        let action = event.action;
        let workflow_id = event.workflow_id.clone();
        if let Ok(n) = self.sender.send(event) {
            debug!(
                action = ?action,
                workflow_id = %workflow_id,
                subscribers = n,
                "WorkflowEvent emitted"
            );
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WorkflowAction;

    #[test]
    fn test_emit_without_subscriber_no_panic() {
        let bus = EventBus::default();
        bus.emit(WorkflowEvent::new(WorkflowAction::Created, "wf-1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(WorkflowEvent::new(WorkflowAction::Created, "wf-1"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.action, WorkflowAction::Created);
        assert_eq!(received.workflow_id, "wf-1");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(WorkflowEvent::new(WorkflowAction::Deleted, "wf-7"));

        assert_eq!(rx1.recv().await.unwrap().workflow_id, "wf-7");
        assert_eq!(rx2.recv().await.unwrap().workflow_id, "wf-7");
    }
}
