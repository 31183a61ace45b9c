//! Authentication: Google OAuth + JWT
//!
//! - `models`: `AuthToken`, `User`, `OAuthCredential` wire shapes
//! - `jwt`: HS256 session tokens
//! - `google`: OAuth2 authorization code flow with Workspace scopes
//! - `middleware` / `extractor`: axum integration

pub mod extractor;
pub mod google;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use extractor::AuthUser;
pub use middleware::require_auth;
pub use models::{AuthToken, OAuthCredential, TokenType, User};
