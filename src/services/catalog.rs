//! Built-in Google Workspace catalog and scope resolution

use super::models::{GoogleWorkspaceService, ServiceStatus};
use super::ServiceError;
use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// (id, name, description, icon, scopes, endpoint)
type ServiceSpec = (&'static str, &'static str, &'static str, &'static str, &'static [&'static str], &'static str);

const GOOGLE_WORKSPACE: &[ServiceSpec] = &[
    (
        "gmail",
        "Gmail",
        "Read, compose and send email",
        "mail",
        &[
            "https://www.googleapis.com/auth/gmail.send",
            "https://www.googleapis.com/auth/gmail.readonly",
        ],
        "https://gmail.googleapis.com/gmail/v1",
    ),
    (
        "drive",
        "Google Drive",
        "Browse, upload and share files",
        "folder",
        &["https://www.googleapis.com/auth/drive.file"],
        "https://www.googleapis.com/drive/v3",
    ),
    (
        "sheets",
        "Google Sheets",
        "Read and write spreadsheet ranges",
        "table",
        &["https://www.googleapis.com/auth/spreadsheets"],
        "https://sheets.googleapis.com/v4",
    ),
    (
        "docs",
        "Google Docs",
        "Create and edit documents",
        "file-text",
        &["https://www.googleapis.com/auth/documents"],
        "https://docs.googleapis.com/v1",
    ),
    (
        "calendar",
        "Google Calendar",
        "List and schedule events",
        "calendar",
        &["https://www.googleapis.com/auth/calendar"],
        "https://www.googleapis.com/calendar/v3",
    ),
    (
        "forms",
        "Google Forms",
        "Create forms and read responses",
        "clipboard",
        &[
            "https://www.googleapis.com/auth/forms.body",
            "https://www.googleapis.com/auth/forms.responses.readonly",
        ],
        "https://forms.googleapis.com/v1",
    ),
    (
        "slides",
        "Google Slides",
        "Create and update presentations",
        "presentation",
        &["https://www.googleapis.com/auth/presentations"],
        "https://slides.googleapis.com/v1",
    ),
];

/// The set of services available to workflows, with per-user status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCatalog {
    pub services: Vec<GoogleWorkspaceService>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceCatalog {
    /// The built-in Google Workspace catalog, every service disconnected
    pub fn google_workspace() -> Self {
        let services = GOOGLE_WORKSPACE
            .iter()
            .map(|(id, name, description, icon, scopes, endpoint)| GoogleWorkspaceService {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                icon: Some(icon.to_string()),
                scopes: scopes.iter().map(|s| s.to_string()).collect(),
                api_endpoint: endpoint.to_string(),
                status: ServiceStatus::Disconnected,
            })
            .collect();

        Self {
            services,
            updated_at: Utc::now(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&GoogleWorkspaceService> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn set_status(&mut self, id: &str, status: ServiceStatus) -> Result<(), ServiceError> {
        let service = self
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::Unknown(id.to_string()))?;
        service.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn connected(&self) -> Vec<&GoogleWorkspaceService> {
        self.services.iter().filter(|s| s.is_connected()).collect()
    }

    /// Mark the listed services connected and every other one disconnected
    pub fn sync_connections(&mut self, connected: &[String]) {
        for service in &mut self.services {
            service.status = if connected.contains(&service.id) {
                ServiceStatus::Connected
            } else {
                ServiceStatus::Disconnected
            };
        }
        self.updated_at = Utc::now();
    }

    /// Every OAuth scope the workflow needs, sorted and deduplicated.
    ///
    /// Union of the workflow's own bindings and the catalog scopes of each
    /// service a step uses.
    pub fn required_scopes(&self, workflow: &Workflow) -> Vec<String> {
        let mut scopes: BTreeSet<String> = BTreeSet::new();
        for binding in &workflow.service_bindings {
            scopes.extend(binding.scopes.iter().cloned());
        }
        for service_id in workflow.services() {
            if let Some(service) = self.get(service_id) {
                scopes.extend(service.scopes.iter().cloned());
            }
        }
        scopes.into_iter().collect()
    }

    /// Services used by the workflow that the catalog does not list
    pub fn unknown_services(&self, workflow: &Workflow) -> Vec<String> {
        let mut unknown: BTreeSet<String> = BTreeSet::new();
        let used = workflow
            .services()
            .into_iter()
            .chain(workflow.service_bindings.iter().map(|b| b.service.as_str()));
        for id in used {
            if self.get(id).is_none() {
                unknown.insert(id.to_string());
            }
        }
        unknown.into_iter().collect()
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::google_workspace()
    }
}
