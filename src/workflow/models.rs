//! Workflow document models
//!
//! A workflow is a declarative document: ordered steps that reference each
//! other through `depends_on`, the parameters a user must supply, and the
//! per-service OAuth bindings the steps need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Type tag of a user-supplied parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Email,
    Date,
    File,
    Select,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Email => write!(f, "email"),
            Self::Date => write!(f, "date"),
            Self::File => write!(f, "file"),
            Self::Select => write!(f, "select"),
        }
    }
}

/// A parameter the user fills in before the workflow runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Allowed values for `select` parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// OAuth scopes and API endpoint a workflow needs for one service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceBinding {
    pub service: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_true")]
    pub auth_required: bool,
}

fn default_true() -> bool {
    true
}

/// Status of a single step
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// One step of a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Service id from the catalog (e.g. "gmail", "sheets")
    pub service: String,
    /// Service-specific action (e.g. "send_email", "append_row")
    pub action: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Ids of steps that must finish before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowStep {
    /// Create a pending step with no parameters or dependencies
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        service: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            service: service.into(),
            action: action.into(),
            parameters: Map::new(),
            depends_on: vec![],
            status: StepStatus::Pending,
            output: None,
            error: None,
        }
    }

    /// Builder-style dependency declaration
    pub fn after(mut self, step_id: impl Into<String>) -> Self {
        self.depends_on.push(step_id.into());
        self
    }
}

/// Lifecycle status of a workflow document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Ready,
    Running,
    Completed,
    Failed,
}

/// A declarative workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub user_parameters: Vec<UserParameter>,
    #[serde(default)]
    pub service_bindings: Vec<ServiceBinding>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Create an empty draft workflow with a fresh id
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            steps: vec![],
            user_parameters: vec![],
            service_bindings: vec![],
            status: WorkflowStatus::Draft,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn binding(&self, service: &str) -> Option<&ServiceBinding> {
        self.service_bindings.iter().find(|b| b.service == service)
    }

    /// Distinct services used by steps, in first-use order
    pub fn services(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !seen.contains(&step.service.as_str()) {
                seen.push(step.service.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_deserialize_minimal() {
        let json = r#"{"name":"Weekly digest"}"#;
        let wf: Workflow = serde_json::from_str(json).unwrap();
        assert_eq!(wf.name, "Weekly digest");
        assert!(wf.id.is_empty());
        assert!(wf.steps.is_empty());
        assert_eq!(wf.status, WorkflowStatus::Draft);
    }

    #[test]
    fn test_step_wire_format() {
        let json = r#"{
            "id": "send",
            "name": "Send summary",
            "service": "gmail",
            "action": "send_email",
            "parameters": {"to": "{{recipient}}"},
            "depends_on": ["collect"],
            "status": "running"
        }"#;
        let step: WorkflowStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.depends_on, vec!["collect"]);
        assert_eq!(step.status, StepStatus::Running);
        assert_eq!(step.parameters["to"], "{{recipient}}");

        let back = serde_json::to_value(&step).unwrap();
        assert!(back.get("output").is_none());
        assert!(back.get("error").is_none());
    }

    #[test]
    fn test_user_parameter_type_field() {
        let json = r#"{"name":"recipient","type":"email","required":true}"#;
        let p: UserParameter = serde_json::from_str(json).unwrap();
        assert_eq!(p.param_type, ParameterType::Email);
        assert!(p.required);
        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["type"], "email");
    }

    #[test]
    fn test_binding_auth_required_defaults_true() {
        let b: ServiceBinding = serde_json::from_str(r#"{"service":"drive"}"#).unwrap();
        assert!(b.auth_required);
        assert!(b.scopes.is_empty());
    }

    #[test]
    fn test_services_first_use_order() {
        let mut wf = Workflow::new("wf", "");
        wf.steps = vec![
            WorkflowStep::new("a", "A", "sheets", "read_range"),
            WorkflowStep::new("b", "B", "gmail", "send_email"),
            WorkflowStep::new("c", "C", "sheets", "append_row"),
        ];
        assert_eq!(wf.services(), vec!["sheets", "gmail"]);
        assert!(wf.step("b").is_some());
        assert!(wf.step("z").is_none());
    }
}
