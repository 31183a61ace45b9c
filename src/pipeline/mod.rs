//! The 5-agent pipeline: phases, result envelopes, agents and the
//! conversational discovery session that drives a workflow from intent
//! to an execution-ready document.

pub mod agents;
pub mod discovery;
pub mod models;

pub use agents::{Agent, AgentRole, AgentStatus, ConversationMessage, MessageRole};
pub use discovery::WorkflowDiscovery;
pub use models::{IntentAnalysis, PipelinePhase, PipelineResult, WorkflowGeneration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot move from phase {from} to {to}")]
    InvalidTransition {
        from: PipelinePhase,
        to: PipelinePhase,
    },

    #[error("Intent confidence {confidence} is outside 0..=1")]
    InvalidConfidence { confidence: f64 },

    #[error("Generated workflow is invalid: {}", .0.join("; "))]
    InvalidWorkflow(Vec<String>),
}
