//! Google OAuth2 Authorization Code Flow
//!
//! 1. Build the consent URL (identity scopes + requested Workspace scopes)
//! 2. Exchange the authorization code for tokens
//! 3. Fetch user info from Google's userinfo endpoint

use super::models::OAuthCredential;
use crate::GoogleOAuthConfig;
use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;

/// User information retrieved from Google after successful OAuth
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Google's unique user identifier (the "sub" claim)
    #[serde(rename = "sub")]
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Google token endpoint response
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    /// Space-separated granted scopes
    scope: Option<String>,
}

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const IDENTITY_SCOPES: [&str; 3] = ["openid", "email", "profile"];

pub const GOOGLE_PROVIDER: &str = "google";

/// Google OAuth2 client for the authorization code flow
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleOAuthConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url: config
                .token_url
                .clone()
                .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            userinfo_url: config
                .userinfo_url
                .clone()
                .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_string()),
            http_client: reqwest::Client::new(),
        }
    }

    /// Consent URL requesting identity scopes plus `workspace_scopes`.
    ///
    /// `access_type=offline` asks for a refresh token; previously granted
    /// scopes are kept with `include_granted_scopes`.
    pub fn auth_url(&self, workspace_scopes: &[String]) -> String {
        let mut scopes: Vec<&str> = IDENTITY_SCOPES.to_vec();
        for scope in workspace_scopes {
            if !scopes.contains(&scope.as_str()) {
                scopes.push(scope);
            }
        }

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&include_granted_scopes=true&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
        )
    }

    /// Exchange an authorization code for user info and the Google credential.
    pub async fn exchange_code(&self, code: &str) -> Result<(GoogleUserInfo, OAuthCredential)> {
        let token_response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to request Google token")?;

        if !token_response.status().is_success() {
            let status = token_response.status();
            let body = token_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            bail!("Google token exchange failed ({}): {}", status, body);
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .context("Failed to parse Google token response")?;

        let userinfo_response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("Failed to request Google userinfo")?;

        if !userinfo_response.status().is_success() {
            let status = userinfo_response.status();
            let body = userinfo_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            bail!("Google userinfo fetch failed ({}): {}", status, body);
        }

        let user_info: GoogleUserInfo = userinfo_response
            .json()
            .await
            .context("Failed to parse Google userinfo response")?;

        Ok((user_info, credential_from_token(token)))
    }
}

fn credential_from_token(token: TokenResponse) -> OAuthCredential {
    OAuthCredential {
        provider: GOOGLE_PROVIDER.to_string(),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        scopes: token
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    }
}
