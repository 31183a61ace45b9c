//! Agents participating in a discovery session and their messages

use super::models::PipelinePhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    IntentGatherer,
    IntentAnalyzer,
    WorkflowGenerator,
    ExecutionPreparer,
    Executor,
}

impl AgentRole {
    /// Phase during which the agent is active.
    ///
    /// The gatherer and analyzer share intent analysis; the executor only
    /// acts once the pipeline completed.
    pub fn phase(self) -> PipelinePhase {
        match self {
            Self::IntentGatherer | Self::IntentAnalyzer => PipelinePhase::IntentAnalysis,
            Self::WorkflowGenerator => PipelinePhase::WorkflowGeneration,
            Self::ExecutionPreparer => PipelinePhase::ExecutionPreparation,
            Self::Executor => PipelinePhase::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Active,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: AgentStatus,
}

impl Agent {
    /// The five agents of the pipeline, all idle
    pub fn default_roster() -> Vec<Agent> {
        [
            (AgentRole::IntentGatherer, "Intent Gatherer", "Talks with the user to collect what should be automated"),
            (AgentRole::IntentAnalyzer, "Intent Analyzer", "Turns the conversation into a structured intent"),
            (AgentRole::WorkflowGenerator, "Workflow Generator", "Drafts the workflow steps and bindings"),
            (AgentRole::ExecutionPreparer, "Execution Preparer", "Checks parameters, scopes and dependency order"),
            (AgentRole::Executor, "Executor", "Runs the prepared workflow against Google Workspace"),
        ]
        .into_iter()
        .map(|(role, name, description)| Agent {
            id: serde_json::to_value(role)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            name: name.to_string(),
            role,
            description: description.to_string(),
            status: AgentStatus::Idle,
        })
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Set when `role` is `agent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            agent_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn from_agent(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::Agent, content);
        msg.agent_id = Some(agent_id.into());
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = Agent::default_roster();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster[0].id, "intent_gatherer");
        assert_eq!(roster[4].role, AgentRole::Executor);
        assert!(roster.iter().all(|a| a.status == AgentStatus::Idle));
    }

    #[test]
    fn test_role_phases() {
        assert_eq!(AgentRole::IntentGatherer.phase(), PipelinePhase::IntentAnalysis);
        assert_eq!(AgentRole::WorkflowGenerator.phase(), PipelinePhase::WorkflowGeneration);
        assert_eq!(AgentRole::Executor.phase(), PipelinePhase::Completed);
    }

    #[test]
    fn test_agent_message() {
        let msg = ConversationMessage::from_agent("intent_gatherer", "What should happen weekly?");
        assert_eq!(msg.role, MessageRole::Agent);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["agent_id"], "intent_gatherer");

        let user = ConversationMessage::new(MessageRole::User, "Send me a digest");
        assert!(serde_json::to_value(&user).unwrap().get("agent_id").is_none());
    }
}
