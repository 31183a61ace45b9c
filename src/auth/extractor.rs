//! `AuthUser`: the caller identity handlers work with.
//!
//! Built from the claims `require_auth` stores in request extensions. In open
//! mode those are the anonymous claims, so handlers never branch on whether
//! auth is configured.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::jwt::{Claims, ANONYMOUS_USER_ID};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl AuthUser {
    /// True for the shared identity used when the server runs without auth
    pub fn is_anonymous(&self) -> bool {
        self.user_id == ANONYMOUS_USER_ID
    }
}

impl TryFrom<&Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("Token subject is not a user id: {}", claims.sub)))?;
        Ok(Self {
            user_id,
            email: claims.email.clone(),
            name: claims.name.clone(),
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Claims>() {
            Some(claims) => AuthUser::try_from(claims),
            // route mounted outside `require_auth`
            None => Err(AppError::Unauthorized("Sign-in required".to_string())),
        }
    }
}
