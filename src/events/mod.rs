//! Workflow change events for real-time UI updates
//!
//! - `WorkflowEvent`: emitted after every workflow mutation
//! - `EventBus`: broadcast channel fan-out to subscribers

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{EventEmitter, WorkflowAction, WorkflowEvent};
