//! Conversational discovery session
//!
//! A session walks the phases strictly in order. Each `record_*` call is
//! accepted only in its own phase and moves the session one phase forward;
//! anything else is an `InvalidTransition` and leaves the session untouched.
//! A rejected workflow sends the session back to workflow generation so the
//! generator can produce a replacement.

use super::agents::{Agent, AgentRole, AgentStatus, ConversationMessage};
use super::models::{IntentAnalysis, PipelinePhase, PipelineResult, WorkflowGeneration};
use super::PipelineError;
use crate::workflow::{validate, Workflow, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDiscovery {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default)]
    pub current_phase: PipelinePhase,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_workflow: Option<WorkflowGeneration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl WorkflowDiscovery {
    /// New session in intent analysis with the gatherer active
    pub fn new() -> Self {
        let mut session = Self {
            session_id: Uuid::new_v4().to_string(),
            messages: vec![],
            current_phase: PipelinePhase::IntentAnalysis,
            agents: Agent::default_roster(),
            intent: None,
            generated_workflow: None,
            error: None,
            created_at: Utc::now(),
        };
        session.set_agent_status(AgentRole::IntentGatherer, AgentStatus::Active);
        session
    }

    pub fn push_message(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    pub fn agent(&self, role: AgentRole) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role == role)
    }

    fn set_agent_status(&mut self, role: AgentRole, status: AgentStatus) {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.role == role) {
            agent.status = status;
        }
    }

    fn check_advance(&self, target: PipelinePhase) -> Result<(), PipelineError> {
        if self.current_phase.can_advance_to(target) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                from: self.current_phase,
                to: target,
            })
        }
    }

    fn advance(&mut self, target: PipelinePhase) {
        tracing::debug!(
            session_id = %self.session_id,
            from = %self.current_phase,
            to = %target,
            "Discovery phase changed"
        );
        self.current_phase = target;
    }

    /// Store the analyzed intent and move on to workflow generation
    pub fn record_intent(&mut self, analysis: IntentAnalysis) -> Result<(), PipelineError> {
        self.check_advance(PipelinePhase::WorkflowGeneration)?;
        if !(0.0..=1.0).contains(&analysis.confidence) {
            return Err(PipelineError::InvalidConfidence {
                confidence: analysis.confidence,
            });
        }

        self.intent = Some(analysis);
        self.set_agent_status(AgentRole::IntentGatherer, AgentStatus::Completed);
        self.set_agent_status(AgentRole::IntentAnalyzer, AgentStatus::Completed);
        self.set_agent_status(AgentRole::WorkflowGenerator, AgentStatus::Active);
        self.advance(PipelinePhase::WorkflowGeneration);
        Ok(())
    }

    /// Store the generated workflow and move on to execution preparation
    pub fn record_workflow(&mut self, generation: WorkflowGeneration) -> Result<(), PipelineError> {
        self.check_advance(PipelinePhase::ExecutionPreparation)?;

        self.generated_workflow = Some(generation);
        self.error = None;
        self.set_agent_status(AgentRole::WorkflowGenerator, AgentStatus::Completed);
        self.set_agent_status(AgentRole::ExecutionPreparer, AgentStatus::Active);
        self.advance(PipelinePhase::ExecutionPreparation);
        Ok(())
    }

    /// Validate the generated workflow; on success mark it ready and complete
    /// the session.
    ///
    /// A failed validation rejects the workflow (see `reject_workflow`).
    pub fn prepare_execution(&mut self) -> Result<(), PipelineError> {
        self.check_advance(PipelinePhase::Completed)?;

        let from = self.current_phase;
        let Some(generation) = self.generated_workflow.as_mut() else {
            return Err(PipelineError::InvalidTransition {
                from,
                to: PipelinePhase::Completed,
            });
        };

        let report = validate(&generation.workflow);
        if !report.valid {
            self.reject_workflow(report.errors.join("; "));
            return Err(PipelineError::InvalidWorkflow(report.errors));
        }

        generation.workflow.status = WorkflowStatus::Ready;
        generation.workflow.updated_at = Some(Utc::now());
        self.error = None;
        self.set_agent_status(AgentRole::ExecutionPreparer, AgentStatus::Completed);
        self.advance(PipelinePhase::Completed);
        Ok(())
    }

    /// Send the session back to workflow generation with `reason` recorded.
    ///
    /// Valid from execution preparation, or from completed when the prepared
    /// workflow could not be stored. The generated workflow is kept as a
    /// draft for reference until the generator records a new one.
    pub fn reject_workflow(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !matches!(
            self.current_phase,
            PipelinePhase::ExecutionPreparation | PipelinePhase::Completed
        ) {
            tracing::warn!(
                session_id = %self.session_id,
                phase = %self.current_phase,
                "Ignoring workflow rejection outside preparation"
            );
            return;
        }

        tracing::warn!(session_id = %self.session_id, reason = %reason, "Generated workflow rejected");
        if let Some(generation) = self.generated_workflow.as_mut() {
            generation.workflow.status = WorkflowStatus::Draft;
        }
        self.error = Some(reason);
        self.set_agent_status(AgentRole::ExecutionPreparer, AgentStatus::Error);
        self.set_agent_status(AgentRole::WorkflowGenerator, AgentStatus::Active);
        self.advance(PipelinePhase::WorkflowGeneration);
    }

    /// Replace the generated workflow with the copy the store accepted.
    pub fn attach_stored_workflow(&mut self, workflow: Workflow) {
        if let Some(generation) = self.generated_workflow.as_mut() {
            generation.workflow = workflow;
        }
    }

    /// Snapshot of the session as a phase-tagged result
    pub fn result(&self) -> PipelineResult {
        PipelineResult {
            phase: self.current_phase,
            success: self.error.is_none(),
            intent_analysis: self.intent.clone(),
            workflow_generation: self.generated_workflow.clone(),
            error: self.error.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for WorkflowDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MessageRole;
    use crate::workflow::{Workflow, WorkflowStep};
    use serde_json::Map;

    fn intent(confidence: f64) -> IntentAnalysis {
        IntentAnalysis {
            intent: "Mail the weekly sheet".to_string(),
            confidence,
            required_services: vec!["sheets".into(), "gmail".into()],
            extracted_parameters: Map::new(),
            clarifications_needed: vec![],
        }
    }

    fn generation(valid: bool) -> WorkflowGeneration {
        let mut wf = Workflow::new("Weekly mail", "");
        wf.steps = vec![
            WorkflowStep::new("read", "Read", "sheets", "read_range"),
            WorkflowStep::new("mail", "Mail", "gmail", "send_email").after(if valid {
                "read"
            } else {
                "missing"
            }),
        ];
        WorkflowGeneration {
            workflow: wf,
            explanation: "Reads then mails".to_string(),
            estimated_duration_secs: Some(30),
        }
    }

    #[test]
    fn test_full_happy_path() {
        let mut session = WorkflowDiscovery::new();
        session.push_message(ConversationMessage::new(MessageRole::User, "Mail my sheet weekly"));
        assert_eq!(
            session.agent(AgentRole::IntentGatherer).unwrap().status,
            AgentStatus::Active
        );

        session.record_intent(intent(0.9)).unwrap();
        assert_eq!(session.current_phase, PipelinePhase::WorkflowGeneration);

        session.record_workflow(generation(true)).unwrap();
        assert_eq!(session.current_phase, PipelinePhase::ExecutionPreparation);

        session.prepare_execution().unwrap();
        assert_eq!(session.current_phase, PipelinePhase::Completed);

        let result = session.result();
        assert!(result.success);
        assert_eq!(result.phase, PipelinePhase::Completed);
        assert_eq!(
            result.workflow_generation.unwrap().workflow.status,
            WorkflowStatus::Ready
        );
        assert_eq!(
            session.agent(AgentRole::ExecutionPreparer).unwrap().status,
            AgentStatus::Completed
        );
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut session = WorkflowDiscovery::new();
        let err = session.record_workflow(generation(true)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: PipelinePhase::IntentAnalysis,
                to: PipelinePhase::ExecutionPreparation
            }
        ));
        assert!(session.generated_workflow.is_none());

        assert!(session.prepare_execution().is_err());

        session.record_intent(intent(0.5)).unwrap();
        assert!(session.record_intent(intent(0.5)).is_err());
    }

    #[test]
    fn test_confidence_out_of_range() {
        let mut session = WorkflowDiscovery::new();
        let err = session.record_intent(intent(1.5)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfidence { .. }));
        assert_eq!(session.current_phase, PipelinePhase::IntentAnalysis);
        assert!(session.intent.is_none());
    }

    #[test]
    fn test_invalid_workflow_returns_to_generation() {
        let mut session = WorkflowDiscovery::new();
        session.record_intent(intent(0.9)).unwrap();
        session.record_workflow(generation(false)).unwrap();

        let err = session.prepare_execution().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidWorkflow(_)));
        assert_eq!(session.current_phase, PipelinePhase::WorkflowGeneration);

        let result = session.result();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("unknown step 'missing'"));
        assert_eq!(
            session.agent(AgentRole::ExecutionPreparer).unwrap().status,
            AgentStatus::Error
        );
        assert_eq!(
            session.agent(AgentRole::WorkflowGenerator).unwrap().status,
            AgentStatus::Active
        );

        // the generator can retry with a fixed workflow
        session.record_workflow(generation(true)).unwrap();
        assert!(session.error.is_none());
        session.prepare_execution().unwrap();
        assert_eq!(session.current_phase, PipelinePhase::Completed);
        assert!(session.result().success);
    }

    #[test]
    fn test_reject_after_completion_reopens_generation() {
        let mut session = WorkflowDiscovery::new();
        session.record_intent(intent(0.9)).unwrap();
        session.record_workflow(generation(true)).unwrap();
        session.prepare_execution().unwrap();

        session.reject_workflow("Workflow already exists: weekly");
        assert_eq!(session.current_phase, PipelinePhase::WorkflowGeneration);
        assert_eq!(
            session.generated_workflow.as_ref().unwrap().workflow.status,
            WorkflowStatus::Draft
        );
        let result = session.result();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Workflow already exists: weekly"));
    }

    #[test]
    fn test_reject_ignored_before_preparation() {
        let mut session = WorkflowDiscovery::new();
        session.reject_workflow("too early");
        assert_eq!(session.current_phase, PipelinePhase::IntentAnalysis);
        assert!(session.error.is_none());
    }

    #[test]
    fn test_attach_stored_workflow() {
        let mut session = WorkflowDiscovery::new();
        session.record_intent(intent(0.9)).unwrap();
        session.record_workflow(generation(true)).unwrap();
        session.prepare_execution().unwrap();

        let mut stored = session.generated_workflow.clone().unwrap().workflow;
        stored.id = "wf-42".to_string();
        session.attach_stored_workflow(stored);
        assert_eq!(
            session.result().workflow_generation.unwrap().workflow.id,
            "wf-42"
        );
    }

    #[test]
    fn test_session_serializes_phase() {
        let session = WorkflowDiscovery::new();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["current_phase"], "intent_analysis");
        assert_eq!(json["agents"].as_array().unwrap().len(), 5);
        assert!(json.get("intent").is_none());
    }
}
