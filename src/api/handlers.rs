//! API request handlers

use super::response::ApiResponse;
use crate::auth::google::{GoogleOAuthClient, GoogleUserInfo, GOOGLE_PROVIDER};
use crate::auth::jwt::issue_token;
use crate::auth::{AuthToken, AuthUser, OAuthCredential, User};
use crate::events::EventBus;
use crate::pipeline::{PipelineError, WorkflowDiscovery};
use crate::services::{GoogleWorkspaceService, ServiceCatalog, ServiceError, ServiceStatus};
use crate::workflow::{
    execution_order, resolve_parameters, validate, ValidationReport, Workflow, WorkflowError,
    WorkflowOrFile, WorkflowStore,
};
use crate::Config;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared server state
pub struct ServerState {
    pub config: Arc<Config>,
    pub workflows: WorkflowStore,
    pub event_bus: Arc<EventBus>,
    /// Users seen by this server, keyed by JWT subject
    pub users: RwLock<HashMap<Uuid, User>>,
    /// Open discovery sessions keyed by session id
    pub sessions: RwLock<HashMap<String, WorkflowDiscovery>>,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(config: Config) -> Self {
        let event_bus = Arc::new(EventBus::default());
        Self {
            config: Arc::new(config),
            workflows: WorkflowStore::with_emitter(event_bus.clone()),
            event_bus,
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the user record for an authenticated identity, creating it on
    /// first sight.
    pub async fn user_for(&self, auth: &AuthUser) -> User {
        let mut users = self.users.write().await;
        user_entry(&mut users, auth).clone()
    }

    /// Create or refresh the user behind a Google sign-in.
    ///
    /// Users are matched by e-mail. The credential is stored under the
    /// `google` provider and every catalog service whose scopes were all
    /// granted is marked connected.
    pub async fn upsert_google_user(
        &self,
        info: GoogleUserInfo,
        credential: OAuthCredential,
    ) -> User {
        let mut users = self.users.write().await;
        let id = users
            .values()
            .find(|u| u.email == info.email)
            .map(|u| u.id)
            .unwrap_or_else(Uuid::new_v4);

        let user = users.entry(id).or_insert_with(|| {
            tracing::info!(email = %info.email, "Registered user");
            let mut user = User::new(info.email.clone(), info.name.clone());
            user.id = id;
            user
        });
        user.name = info.name;
        user.picture = info.picture;

        for service in ServiceCatalog::google_workspace().services {
            if credential.has_scopes(&service.scopes) {
                user.connect_service(&service.id);
            }
        }
        user.oauth.insert(GOOGLE_PROVIDER.to_string(), credential);
        user.clone()
    }

    /// Built-in catalog with statuses reflecting the user's connections
    pub fn catalog_for(user: &User) -> ServiceCatalog {
        let mut catalog = ServiceCatalog::google_workspace();
        catalog.sync_connections(&user.connected_services);
        catalog
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub workflows: usize,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        workflows: state.workflows.len().await,
    })
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ConsentQuery {
    /// Comma-separated catalog ids whose scopes should be requested
    pub services: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub scopes: Vec<String>,
}

/// Google consent URL for identity plus the requested services' scopes
pub async fn google_login(
    State(state): State<SharedState>,
    Query(query): Query<ConsentQuery>,
) -> Result<Json<ApiResponse<AuthUrlResponse>>, AppError> {
    let google = state
        .config
        .auth_config
        .as_ref()
        .and_then(|a| a.google.as_ref())
        .ok_or_else(|| AppError::BadRequest("Google OAuth is not configured".to_string()))?;

    let catalog = ServiceCatalog::google_workspace();
    let mut scopes: Vec<String> = Vec::new();
    for id in query
        .services
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let service = catalog
            .get(id)
            .ok_or_else(|| AppError::from(ServiceError::Unknown(id.to_string())))?;
        for scope in &service.scopes {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
    }

    let client = GoogleOAuthClient::new(google);
    Ok(Json(ApiResponse::ok(AuthUrlResponse {
        auth_url: client.auth_url(&scopes),
        scopes,
    })))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub user: User,
}

/// Exchange the Google authorization code for a session JWT and the user.
pub async fn google_callback(
    State(state): State<SharedState>,
    Json(req): Json<GoogleCallbackRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let auth_config = state
        .config
        .auth_config
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Google OAuth is not configured".to_string()))?;
    let google = auth_config
        .google
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Google OAuth is not configured".to_string()))?;

    let (info, credential) = GoogleOAuthClient::new(google)
        .exchange_code(&req.code)
        .await
        .map_err(|e| AppError::BadRequest(format!("OAuth code exchange failed: {}", e)))?;

    if let Some(ref domain) = auth_config.allowed_email_domain {
        if !info.email.ends_with(&format!("@{}", domain)) {
            tracing::warn!(email = %info.email, "Rejected sign-in from disallowed domain");
            return Err(AppError::Forbidden(format!(
                "Email domain not allowed (expected @{})",
                domain
            )));
        }
    }

    let user = state.upsert_google_user(info, credential).await;
    let token = issue_token(
        user.id,
        &user.email,
        &user.name,
        &auth_config.jwt_secret,
        auth_config.jwt_expiry_secs,
    )?;
    tracing::info!(email = %user.email, services = ?user.connected_services, "Signed in with Google");

    Ok(Json(ApiResponse::ok(LoginResponse { token, user })))
}

pub async fn get_me(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(state.user_for(&auth).await))
}

// ============================================================================
// Services
// ============================================================================

pub async fn list_services(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Json<ApiResponse<ServiceCatalog>> {
    let user = state.user_for(&auth).await;
    Json(ApiResponse::ok(ServerState::catalog_for(&user)))
}

pub async fn connect_service(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<ApiResponse<GoogleWorkspaceService>>, AppError> {
    set_connection(&state, &auth, &service_id, ServiceStatus::Connected).await
}

pub async fn disconnect_service(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<ApiResponse<GoogleWorkspaceService>>, AppError> {
    set_connection(&state, &auth, &service_id, ServiceStatus::Disconnected).await
}

async fn set_connection(
    state: &ServerState,
    auth: &AuthUser,
    service_id: &str,
    status: ServiceStatus,
) -> Result<Json<ApiResponse<GoogleWorkspaceService>>, AppError> {
    let mut service = ServiceCatalog::google_workspace()
        .get(service_id)
        .cloned()
        .ok_or_else(|| ServiceError::Unknown(service_id.to_string()))?;

    let changed = {
        let mut users = state.users.write().await;
        let user = user_entry(&mut users, auth);
        if status == ServiceStatus::Connected {
            user.connect_service(service_id)
        } else {
            user.disconnect_service(service_id)
        }
    };

    tracing::info!(service = %service_id, status = ?status, changed, "Service connection updated");
    service.status = status;
    let message = if changed { "Updated" } else { "Unchanged" };
    Ok(Json(ApiResponse::ok_with_message(service, message)))
}

// ============================================================================
// Workflows
// ============================================================================

pub async fn list_workflows(State(state): State<SharedState>) -> Json<ApiResponse<Vec<Workflow>>> {
    Json(ApiResponse::ok(state.workflows.list().await))
}

/// Accepts either a workflow or a stored workflow file; rejects documents
/// with structural errors.
pub async fn create_workflow(
    State(state): State<SharedState>,
    Json(body): Json<WorkflowOrFile>,
) -> Result<(StatusCode, Json<ApiResponse<Workflow>>), AppError> {
    let workflow = body.normalize()?;
    let report = validate(&workflow);
    if !report.valid {
        return Err(WorkflowError::Invalid(report.errors).into());
    }
    let created = state.workflows.create(workflow).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(created, "Workflow created")),
    ))
}

pub async fn get_workflow(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<ApiResponse<Workflow>>, AppError> {
    let workflow = find_workflow(&state, &workflow_id).await?;
    Ok(Json(ApiResponse::ok(workflow)))
}

pub async fn delete_workflow(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.workflows.delete(&workflow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn validate_workflow(
    Json(body): Json<WorkflowOrFile>,
) -> Result<Json<ApiResponse<ValidationReport>>, AppError> {
    let workflow = body.normalize()?;
    Ok(Json(ApiResponse::ok(validate(&workflow))))
}

pub async fn normalize_workflow(
    Json(body): Json<WorkflowOrFile>,
) -> Result<Json<ApiResponse<Workflow>>, AppError> {
    Ok(Json(ApiResponse::ok(body.normalize()?)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionOrderResponse {
    pub levels: Vec<Vec<String>>,
}

pub async fn get_execution_order(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<ApiResponse<ExecutionOrderResponse>>, AppError> {
    let workflow = find_workflow(&state, &workflow_id).await?;
    let levels = execution_order(&workflow)?;
    Ok(Json(ApiResponse::ok(ExecutionOrderResponse { levels })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScopesResponse {
    pub scopes: Vec<String>,
    /// Services used by the workflow that are not in the catalog
    pub unknown_services: Vec<String>,
    /// Catalog services used by the workflow that the user has not connected
    pub unconnected_services: Vec<String>,
}

pub async fn get_required_scopes(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(workflow_id): Path<String>,
) -> Result<Json<ApiResponse<ScopesResponse>>, AppError> {
    let workflow = find_workflow(&state, &workflow_id).await?;
    let user = state.user_for(&auth).await;
    let catalog = ServerState::catalog_for(&user);

    let unknown_services = catalog.unknown_services(&workflow);
    let unconnected_services = workflow
        .services()
        .into_iter()
        .filter(|id| catalog.get(id).is_some_and(|s| !s.is_connected()))
        .map(str::to_string)
        .collect();

    Ok(Json(ApiResponse::ok(ScopesResponse {
        scopes: catalog.required_scopes(&workflow),
        unknown_services,
        unconnected_services,
    })))
}

pub async fn resolve_workflow_parameters(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
    Json(supplied): Json<Map<String, Value>>,
) -> Result<Json<ApiResponse<Map<String, Value>>>, AppError> {
    let workflow = find_workflow(&state, &workflow_id).await?;
    Ok(Json(ApiResponse::ok(resolve_parameters(&workflow, &supplied)?)))
}

fn user_entry<'a>(users: &'a mut HashMap<Uuid, User>, auth: &AuthUser) -> &'a mut User {
    users.entry(auth.user_id).or_insert_with(|| {
        tracing::info!(email = %auth.email, "Registered user");
        let mut user = User::new(auth.email.clone(), auth.name.clone());
        user.id = auth.user_id;
        user
    })
}

async fn find_workflow(state: &ServerState, workflow_id: &str) -> Result<Workflow, AppError> {
    state
        .workflows
        .get(workflow_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Workflow not found: {}", workflow_id)))
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type, rendered as an `ApiResponse` with `success: false`
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(_) => AppError::NotFound(err.to_string()),
            WorkflowError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
