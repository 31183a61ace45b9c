//! Service descriptor models

use serde::{Deserialize, Serialize};

/// Connection status of a service for the current user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Connected,
    #[default]
    Disconnected,
    Error,
    Pending,
}

/// A Google Workspace API a workflow step can target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleWorkspaceService {
    /// Short id used by workflow steps (e.g. "gmail")
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// OAuth scopes needed to use the service
    #[serde(default)]
    pub scopes: Vec<String>,
    pub api_endpoint: String,
    #[serde(default)]
    pub status: ServiceStatus,
}

impl GoogleWorkspaceService {
    pub fn is_connected(&self) -> bool {
        self.status == ServiceStatus::Connected
    }
}
