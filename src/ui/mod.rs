//! Client store-state shapes served to and persisted by the web frontend

pub mod state;

pub use state::{
    AuthState, Notification, NotificationType, ServiceState, Theme, UIState, WorkflowState,
};
