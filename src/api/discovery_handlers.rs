//! Discovery session handlers
//!
//! Agents post their results here; the session enforces phase order and,
//! once execution preparation succeeds, the ready workflow is stored.
//! At most `MAX_SESSIONS` sessions are kept; finished ones are evicted first.

use super::handlers::{AppError, SharedState};
use super::response::ApiResponse;
use crate::pipeline::{
    ConversationMessage, IntentAnalysis, PipelineResult, WorkflowDiscovery, WorkflowGeneration,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::collections::HashMap;

pub const MAX_SESSIONS: usize = 1024;

pub async fn create_session(
    State(state): State<SharedState>,
) -> (StatusCode, Json<ApiResponse<WorkflowDiscovery>>) {
    let session = WorkflowDiscovery::new();
    tracing::info!(session_id = %session.session_id, "Discovery session started");
    let mut sessions = state.sessions.write().await;
    evict_sessions(&mut sessions, MAX_SESSIONS - 1);
    sessions.insert(session.session_id.clone(), session.clone());
    (StatusCode::CREATED, Json(ApiResponse::ok(session)))
}

pub async fn get_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<WorkflowDiscovery>>, AppError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    Ok(Json(ApiResponse::ok(session.clone())))
}

pub async fn post_message(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(message): Json<ConversationMessage>,
) -> Result<Json<ApiResponse<WorkflowDiscovery>>, AppError> {
    with_session(&state, &session_id, |session| {
        session.push_message(message);
        Ok(())
    })
    .await
}

pub async fn record_intent(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(analysis): Json<IntentAnalysis>,
) -> Result<Json<ApiResponse<WorkflowDiscovery>>, AppError> {
    with_session(&state, &session_id, |session| {
        session.record_intent(analysis).map_err(AppError::from)
    })
    .await
}

pub async fn record_workflow(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(generation): Json<WorkflowGeneration>,
) -> Result<Json<ApiResponse<WorkflowDiscovery>>, AppError> {
    with_session(&state, &session_id, |session| {
        session.record_workflow(generation).map_err(AppError::from)
    })
    .await
}

/// Validate and complete the session, then add the ready workflow to the
/// workflow store.
///
/// If the store refuses the workflow the session goes back to workflow
/// generation with the error recorded, so a new workflow can be generated.
pub async fn prepare_execution(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<PipelineResult>>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    session.prepare_execution()?;

    if let Some(workflow) = session
        .generated_workflow
        .as_ref()
        .map(|g| g.workflow.clone())
    {
        match state.workflows.create(workflow).await {
            Ok(stored) => session.attach_stored_workflow(stored),
            Err(e) => {
                session.reject_workflow(e.to_string());
                return Err(e.into());
            }
        }
    }

    Ok(Json(ApiResponse::ok_with_message(
        session.result(),
        "Workflow ready for execution",
    )))
}

pub async fn delete_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    tracing::info!(session_id = %session_id, "Discovery session closed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_result(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<PipelineResult>>, AppError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    Ok(Json(ApiResponse::ok(session.result())))
}

async fn with_session<F>(
    state: &SharedState,
    session_id: &str,
    apply: F,
) -> Result<Json<ApiResponse<WorkflowDiscovery>>, AppError>
where
    F: FnOnce(&mut WorkflowDiscovery) -> Result<(), AppError>,
{
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    apply(session)?;
    Ok(Json(ApiResponse::ok(session.clone())))
}

fn session_not_found(session_id: &str) -> AppError {
    AppError::NotFound(format!("Discovery session not found: {}", session_id))
}

/// Shrink `sessions` to at most `keep` entries: completed sessions go first,
/// then the oldest by creation time.
fn evict_sessions(sessions: &mut HashMap<String, WorkflowDiscovery>, keep: usize) {
    if sessions.len() <= keep {
        return;
    }

    let mut candidates: Vec<(bool, chrono::DateTime<chrono::Utc>, String)> = sessions
        .values()
        .map(|s| (!s.current_phase.is_terminal(), s.created_at, s.session_id.clone()))
        .collect();
    // completed (false) before open (true), oldest first within each group
    candidates.sort();

    let excess = sessions.len() - keep;
    for (_, _, id) in candidates.into_iter().take(excess) {
        sessions.remove(&id);
    }
    tracing::debug!(evicted = excess, "Evicted discovery sessions");
}
