//! Shared fixtures for unit tests

use crate::api::handlers::{ServerState, SharedState};
use crate::{AuthConfig, Config, GoogleOAuthConfig};
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        allowed_email_domain: None,
        google: Some(GoogleOAuthConfig {
            client_id: "test-id".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            token_url: None,
            userinfo_url: None,
        }),
    }
}

pub fn test_state(auth_config: Option<AuthConfig>) -> SharedState {
    Arc::new(ServerState::new(Config {
        auth_config,
        ..Config::default()
    }))
}
