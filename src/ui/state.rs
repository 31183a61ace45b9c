//! Store-state records
//!
//! These mirror the frontend stores so that the server can hydrate them on
//! first load and tests can pin their wire shape.

use crate::auth::{AuthToken, User};
use crate::services::ServiceCatalog;
use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Oldest notifications are dropped past this count
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AuthToken>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthState {
    pub fn signed_in(user: User, token: AuthToken) -> Self {
        Self {
            is_authenticated: token.is_usable(),
            user: Some(user),
            token: Some(token),
            is_loading: false,
            error: None,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowState {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_workflow: Option<Workflow>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowState {
    /// Replace the workflow with the same id or append it
    pub fn upsert(&mut self, workflow: Workflow) {
        if let Some(current) = self.current_workflow.as_mut() {
            if current.id == workflow.id {
                *current = workflow.clone();
            }
        }
        match self.workflows.iter_mut().find(|w| w.id == workflow.id) {
            Some(existing) => *existing = workflow,
            None => self.workflows.push(workflow),
        }
    }

    /// Make a listed workflow current. Returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        match self.workflows.iter().find(|w| w.id == id) {
            Some(wf) => {
                self.current_workflow = Some(wf.clone());
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<ServiceCatalog>,
    /// Service id whose OAuth consent is in flight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connecting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIState {
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
    #[serde(default)]
    pub theme: Theme,
    /// Newest first
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

fn default_sidebar_open() -> bool {
    true
}

impl Default for UIState {
    fn default() -> Self {
        Self {
            sidebar_open: default_sidebar_open(),
            theme: Theme::default(),
            notifications: vec![],
        }
    }
}

impl UIState {
    /// Prepend a notification, trimming the oldest past `MAX_NOTIFICATIONS`.
    /// Returns the notification id.
    pub fn notify(&mut self, notification: Notification) -> String {
        let id = notification.id.clone();
        self.notifications.insert(0, notification);
        self.notifications.truncate(MAX_NOTIFICATIONS);
        id
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}
