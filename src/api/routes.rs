//! API route definitions

use super::discovery_handlers;
use super::handlers::{self, SharedState};
use crate::auth::require_auth;
use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: SharedState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/google", get(handlers::google_login))
        .route("/auth/google/callback", post(handlers::google_callback));

    let protected = Router::new()
        .route("/auth/me", get(handlers::get_me))
        // ====================================================================
        // Services
        // ====================================================================
        .route("/api/services", get(handlers::list_services))
        .route(
            "/api/services/{service_id}/connect",
            post(handlers::connect_service),
        )
        .route(
            "/api/services/{service_id}/disconnect",
            post(handlers::disconnect_service),
        )
        // ====================================================================
        // Workflows
        // ====================================================================
        .route(
            "/api/workflows",
            get(handlers::list_workflows).post(handlers::create_workflow),
        )
        .route("/api/workflows/validate", post(handlers::validate_workflow))
        .route("/api/workflows/normalize", post(handlers::normalize_workflow))
        .route(
            "/api/workflows/{workflow_id}",
            get(handlers::get_workflow).delete(handlers::delete_workflow),
        )
        .route(
            "/api/workflows/{workflow_id}/execution-order",
            get(handlers::get_execution_order),
        )
        .route(
            "/api/workflows/{workflow_id}/scopes",
            get(handlers::get_required_scopes),
        )
        .route(
            "/api/workflows/{workflow_id}/parameters",
            post(handlers::resolve_workflow_parameters),
        )
        // ====================================================================
        // Discovery sessions
        // ====================================================================
        .route("/api/discovery", post(discovery_handlers::create_session))
        .route(
            "/api/discovery/{session_id}",
            get(discovery_handlers::get_session).delete(discovery_handlers::delete_session),
        )
        .route(
            "/api/discovery/{session_id}/messages",
            post(discovery_handlers::post_message),
        )
        .route(
            "/api/discovery/{session_id}/intent",
            post(discovery_handlers::record_intent),
        )
        .route(
            "/api/discovery/{session_id}/workflow",
            post(discovery_handlers::record_workflow),
        )
        .route(
            "/api/discovery/{session_id}/prepare",
            post(discovery_handlers::prepare_execution),
        )
        .route(
            "/api/discovery/{session_id}/result",
            get(discovery_handlers::get_result),
        )
        .layer(from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(cors_layer(state.config.frontend_url.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restrict CORS to the configured frontend, or allow any origin in dev.
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let origin = frontend_url.and_then(|url| {
        let trimmed = url.trim_end_matches('/');
        match HeaderValue::from_str(trimmed) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(url = %url, "Invalid frontend_url, allowing any origin");
                None
            }
        }
    });

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        Some(value) => cors.allow_origin(value),
        None => cors.allow_origin(Any),
    }
}
