//! JWT token encoding and decoding using HS256.
//!
//! The JWT carries the user identity and is sent back by the frontend as
//! a Bearer header on every `/api` request.

use super::models::{AuthToken, TokenType};
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Deterministic id of the anonymous user (auth not configured).
pub const ANONYMOUS_USER_ID: Uuid = Uuid::nil();

impl Claims {
    /// Claims used when the server runs without an `auth` section.
    pub fn anonymous() -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: ANONYMOUS_USER_ID.to_string(),
            email: "anonymous@local".to_string(),
            name: "Anonymous".to_string(),
            iat: now,
            exp: now + 86400 * 365 * 100, // effectively never expires
        }
    }
}

/// Encode a JWT token for the given user.
pub fn encode_jwt(
    user_id: Uuid,
    email: &str,
    name: &str,
    secret: &str,
    expiry_secs: u64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        iat: now,
        exp: now + expiry_secs as i64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT")
}

/// Decode and validate a JWT token (signature and expiry).
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data: TokenData<Claims> = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT")?;

    Ok(token_data.claims)
}

/// Encode a JWT and wrap it in the `AuthToken` envelope the frontend stores.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    name: &str,
    secret: &str,
    expiry_secs: u64,
) -> Result<AuthToken> {
    let token = encode_jwt(user_id, email, name, secret, expiry_secs)?;
    let claims = decode_jwt(&token, secret)?;
    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .context("JWT expiry out of range")?;

    Ok(AuthToken {
        token,
        expires_at,
        token_type: TokenType::Bearer,
        is_valid: true,
    })
}
