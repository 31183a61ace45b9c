//! Identity and credential models shared with the frontend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of bearer credential
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    #[default]
    Bearer,
    Refresh,
}

/// Bearer credential envelope handed to the frontend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub token_type: TokenType,
    #[serde(default = "default_true")]
    pub is_valid: bool,
}

fn default_true() -> bool {
    true
}

impl AuthToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Valid flag set and not yet expired
    pub fn is_usable(&self) -> bool {
        self.is_valid && !self.is_expired()
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Per-provider OAuth credential stored for a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthCredential {
    pub provider: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthCredential {
    /// Required scopes the credential was not granted, in request order
    pub fn missing_scopes<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|s| !self.scopes.contains(*s))
            .map(String::as_str)
            .collect()
    }

    pub fn has_scopes(&self, required: &[String]) -> bool {
        self.missing_scopes(required).is_empty()
    }

    /// Expired credentials with a refresh token can still be renewed
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Identity record with per-provider credentials and connected services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Credentials keyed by provider name (e.g. "google")
    #[serde(default)]
    pub oauth: HashMap<String, OAuthCredential>,
    /// Catalog ids of the services the user connected
    #[serde(default)]
    pub connected_services: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            picture: None,
            oauth: HashMap::new(),
            connected_services: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn is_connected(&self, service: &str) -> bool {
        self.connected_services.iter().any(|s| s == service)
    }

    /// Returns false when the service was already connected
    pub fn connect_service(&mut self, service: &str) -> bool {
        if self.is_connected(service) {
            return false;
        }
        self.connected_services.push(service.to_string());
        true
    }

    /// Returns false when the service was not connected
    pub fn disconnect_service(&mut self, service: &str) -> bool {
        let before = self.connected_services.len();
        self.connected_services.retain(|s| s != service);
        self.connected_services.len() != before
    }

    pub fn credential(&self, provider: &str) -> Option<&OAuthCredential> {
        self.oauth.get(provider)
    }
}
