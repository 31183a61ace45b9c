//! Phase-tagged result envelopes

use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pipeline phases, in the only order they can be traversed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    #[default]
    IntentAnalysis,
    WorkflowGeneration,
    ExecutionPreparation,
    Completed,
}

impl PipelinePhase {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::IntentAnalysis => Some(Self::WorkflowGeneration),
            Self::WorkflowGeneration => Some(Self::ExecutionPreparation),
            Self::ExecutionPreparation => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Only the immediate successor is reachable
    pub fn can_advance_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Completed
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IntentAnalysis => write!(f, "intent_analysis"),
            Self::WorkflowGeneration => write!(f, "workflow_generation"),
            Self::ExecutionPreparation => write!(f, "execution_preparation"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Output of the intent analysis agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentAnalysis {
    /// One-sentence statement of what the user wants automated
    pub intent: String,
    /// 0.0 ..= 1.0
    pub confidence: f64,
    #[serde(default)]
    pub required_services: Vec<String>,
    #[serde(default)]
    pub extracted_parameters: Map<String, Value>,
    /// Questions to ask before a workflow can be generated
    #[serde(default)]
    pub clarifications_needed: Vec<String>,
}

impl IntentAnalysis {
    /// Confident enough and nothing left to clarify
    pub fn is_actionable(&self, threshold: f64) -> bool {
        self.confidence >= threshold && self.clarifications_needed.is_empty()
    }
}

/// Output of the workflow generation agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowGeneration {
    pub workflow: Workflow,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_secs: Option<u64>,
}

/// Snapshot of a pipeline run returned to the frontend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineResult {
    pub phase: PipelinePhase,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_analysis: Option<IntentAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_generation: Option<WorkflowGeneration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}
