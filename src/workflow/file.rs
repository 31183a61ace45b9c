//! Stored workflow files and normalization to in-memory workflows

use super::models::Workflow;
use super::WorkflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A workflow as it is persisted: raw file content plus the parsed payload
/// when the backend already parsed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowFile {
    #[serde(default)]
    pub id: String,
    pub filename: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Workflow>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Either representation of the same logical workflow.
///
/// The file variant is tried first: it is the only one carrying
/// `filename` and `content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WorkflowOrFile {
    File(WorkflowFile),
    Workflow(Workflow),
}

impl WorkflowOrFile {
    /// Reduce either representation to a `Workflow`.
    ///
    /// Files resolve through their `parsed` payload, then their content as
    /// JSON, then as YAML. A workflow without an id takes the file id.
    pub fn normalize(self) -> Result<Workflow, WorkflowError> {
        match self {
            WorkflowOrFile::Workflow(wf) => Ok(wf),
            WorkflowOrFile::File(file) => file.into_workflow(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WorkflowOrFile::Workflow(wf) => &wf.id,
            WorkflowOrFile::File(file) => &file.id,
        }
    }
}

impl WorkflowFile {
    pub fn into_workflow(self) -> Result<Workflow, WorkflowError> {
        let mut workflow = match self.parsed {
            Some(wf) => wf,
            None => parse_content(&self.filename, &self.content)?,
        };
        if workflow.id.is_empty() {
            workflow.id = self.id;
        }
        Ok(workflow)
    }
}

fn parse_content(filename: &str, content: &str) -> Result<Workflow, WorkflowError> {
    if content.trim().is_empty() {
        return Err(WorkflowError::Unparseable {
            filename: filename.to_string(),
            reason: "file is empty".to_string(),
        });
    }

    match serde_json::from_str::<Workflow>(content) {
        Ok(wf) => Ok(wf),
        Err(json_err) => match serde_yaml::from_str::<Workflow>(content) {
            Ok(wf) => {
                tracing::debug!(filename, "Workflow file parsed as YAML");
                Ok(wf)
            }
            Err(yaml_err) => Err(WorkflowError::Unparseable {
                filename: filename.to_string(),
                reason: format!("json: {}; yaml: {}", json_err, yaml_err),
            }),
        },
    }
}
