//! Workspace Flow
//!
//! Contract layer and HTTP API for a 5-agent workflow automation system
//! targeting Google Workspace:
//! - Workflow documents with dependency ordering and parameter resolution
//! - Google Workspace service catalog and OAuth scope resolution
//! - Phase-ordered discovery sessions (intent → generation → preparation)
//! - JWT + Google OAuth authentication
//! - Client store-state shapes for the web frontend

pub mod api;
pub mod auth;
pub mod events;
pub mod pipeline;
pub mod services;
pub mod ui;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    /// Auth section. If absent the API runs without authentication
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// Frontend origin allowed by CORS (e.g. "http://localhost:3000")
    pub frontend_url: Option<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: None,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters)
    pub jwt_secret: String,
    /// JWT token lifetime in seconds (default: 28800 = 8h)
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Optional domain restriction (e.g. "example.com")
    pub allowed_email_domain: Option<String>,
    /// Google OAuth client, required for `/auth/google`
    pub google: Option<GoogleOAuthConfig>,
}

/// Google OAuth2 client credentials
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI after consent (e.g. "http://localhost:3000/auth/callback")
    pub redirect_uri: String,
    /// Token endpoint override (defaults to Google's)
    #[serde(default)]
    pub token_url: Option<String>,
    /// Userinfo endpoint override (defaults to Google's)
    #[serde(default)]
    pub userinfo_url: Option<String>,
}

fn default_jwt_expiry() -> u64 {
    28800 // 8 hours
}

const MIN_JWT_SECRET_LEN: usize = 32;

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub frontend_url: Option<String>,
    /// None means open access (local development)
    pub auth_config: Option<AuthConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            frontend_url: None,
            auth_config: None,
        }
    }
}

impl Config {
    /// Load configuration from `config.yaml` in CWD (if any) and env vars.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default. `JWT_SECRET` only overrides an
    /// existing `auth` section.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let mut auth_config = yaml.auth;
        if let (Some(auth), Ok(secret)) = (auth_config.as_mut(), std::env::var("JWT_SECRET")) {
            auth.jwt_secret = secret;
        }
        if let Some(ref auth) = auth_config {
            if auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
                anyhow::bail!(
                    "auth.jwt_secret must be at least {} characters",
                    MIN_JWT_SECRET_LEN
                );
            }
        }

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .or(yaml.server.frontend_url),
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Build the router and serve it until the process is stopped.
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    if config.auth_config.is_none() {
        tracing::warn!("No auth section configured, API is open to any caller");
    }

    let state = Arc::new(api::handlers::ServerState::new(config));
    let app = api::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9090
  frontend_url: http://localhost:3000

auth:
  jwt_secret: "super-secret-key-min-32-characters!"
  jwt_expiry_secs: 3600
  allowed_email_domain: "example.com"
  google:
    client_id: "123.apps.googleusercontent.com"
    client_secret: "secret123"
    redirect_uri: "http://localhost:3000/auth/callback"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.server.frontend_url.as_deref(),
            Some("http://localhost:3000")
        );

        let auth = config.auth.unwrap();
        assert_eq!(auth.jwt_expiry_secs, 3600);
        assert_eq!(auth.allowed_email_domain, Some("example.com".into()));
        assert_eq!(
            auth.google.unwrap().client_id,
            "123.apps.googleusercontent.com"
        );
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.frontend_url.is_none());
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_jwt_expiry_default() {
        let yaml = r#"
auth:
  jwt_secret: "min-32-chars-secret-key-for-test!"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        let auth = config.auth.unwrap();
        assert_eq!(auth.jwt_expiry_secs, 28800);
        assert!(auth.google.is_none());
    }

    /// Single test for file loading and env overrides, to avoid parallel
    /// env var races.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &["SERVER_PORT", "FRONTEND_URL", "JWT_SECRET"] {
                std::env::remove_var(var);
            }
        }

        let yaml = r#"
server:
  port: 9999
auth:
  jwt_secret: "yaml-secret-that-is-at-least-32-chars"
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        // --- YAML values ---
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 9999);
        assert_eq!(
            config.auth_config.as_ref().unwrap().jwt_secret,
            "yaml-secret-that-is-at-least-32-chars"
        );

        // --- Env overrides ---
        std::env::set_var("SERVER_PORT", "7777");
        std::env::set_var("FRONTEND_URL", "https://flow.example.com");
        std::env::set_var("JWT_SECRET", "env-secret-that-is-also-32-chars-long");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 7777);
        assert_eq!(
            config.frontend_url.as_deref(),
            Some("https://flow.example.com")
        );
        assert_eq!(
            config.auth_config.unwrap().jwt_secret,
            "env-secret-that-is-also-32-chars-long"
        );

        // --- Short secret rejected ---
        std::env::set_var("JWT_SECRET", "short");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- No file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-workspace-flow-config.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.server_port, 8080);
        assert!(config.auth_config.is_none());
    }
}
