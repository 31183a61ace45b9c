//! Auth middleware for Axum routes.
//!
//! Validates JWT Bearer tokens and injects `Claims` into request extensions.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::jwt::{decode_jwt, Claims};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware that requires a valid JWT Bearer token.
///
/// 1. No `auth` config → open mode, anonymous claims are injected
/// 2. Missing or malformed `Authorization: Bearer` header → 401
/// 3. Invalid or expired JWT → 401
/// 4. E-mail outside `allowed_email_domain` → 403
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_config) = state.config.auth_config.as_ref() else {
        req.extensions_mut().insert(Claims::anonymous());
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let claims = decode_jwt(token, &auth_config.jwt_secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if let Some(ref domain) = auth_config.allowed_email_domain {
        if !claims.email.ends_with(&format!("@{}", domain)) {
            tracing::warn!(email = %claims.email, "Rejected token from disallowed domain");
            return Err(AppError::Forbidden(format!(
                "Email domain not allowed (expected @{})",
                domain
            )));
        }
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
