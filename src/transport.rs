//! HTTP transport for the XML API.
//!
//! Requests are POSTed form-encoded (`xml=<document>`) with an OAuth bearer
//! token. The token is obtained from the refresh-token grant and cached until
//! shortly before it expires.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::errors::ApiError;

/// Seconds before expiry at which a cached token is considered stale.
const REFRESH_MARGIN_SECS: i64 = 30;
/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Delivers request documents to the XML API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts one serialized request document.
    ///
    /// # Arguments
    ///
    /// * `xml` - The complete `<Envelope>` request document.
    ///
    /// # Returns
    ///
    /// * `Result<String, ApiError>` - The raw response body, or a transport or
    ///   authentication error. Remote faults are not detected here.
    async fn post(&self, xml: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

struct TokenState {
    access_token: String,
    expires_at: DateTime<Utc>,
    refresh_token: String,
}

impl TokenState {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty()
            && now + TimeDelta::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Production transport: OAuth refresh-token grant plus form POST.
pub struct OAuthTransport {
    client: reqwest::Client,
    api_endpoint: String,
    oauth_endpoint: String,
    client_id: String,
    client_secret: String,
    token: Mutex<TokenState>,
}

impl OAuthTransport {
    /// Creates a new `OAuthTransport`.
    ///
    /// No request is made here; the first [`Transport::post`] performs the
    /// refresh-token grant.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, endpoints and the HTTP timeout.
    ///
    /// # Returns
    ///
    /// * `Result<Self, ApiError>` - The transport, or `ApiError::Transport` if
    ///   the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_endpoint: config.api_endpoint(),
            oauth_endpoint: config.oauth_endpoint(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            // Starts expired so the first request triggers a refresh.
            token: Mutex::new(TokenState {
                access_token: String::new(),
                expires_at: DateTime::<Utc>::MIN_UTC,
                refresh_token: config.refresh_token.clone(),
            }),
        })
    }

    /// Returns a valid access token, refreshing it if needed.
    ///
    /// The lock is held across the refresh so concurrent callers wait for a
    /// single token request instead of each issuing their own.
    async fn access_token(&self) -> Result<String, ApiError> {
        let mut state = self.token.lock().await;
        if state.is_fresh(Utc::now()) {
            return Ok(state.access_token.clone());
        }

        tracing::debug!("Refreshing OAuth access token");
        let response = self
            .client
            .post(&self.oauth_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", state.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("OAuth token refresh rejected with status {}", status);
            return Err(ApiError::Auth(format!(
                "token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Auth(format!("Failed to parse token response: {}", e)))?;

        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let expires_at = TimeDelta::try_seconds(lifetime)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or_else(|| {
                tracing::error!("OAuth token lifetime out of range: {}s", lifetime);
                ApiError::Auth(format!("token lifetime out of range: expires_in={}", lifetime))
            })?;
        state.expires_at = expires_at;
        state.access_token = token.access_token;
        if let Some(rotated) = token.refresh_token.filter(|t| !t.is_empty()) {
            state.refresh_token = rotated;
        }

        tracing::info!("OAuth access token refreshed, valid for {}s", lifetime);
        Ok(state.access_token.clone())
    }

    async fn invalidate_token(&self) {
        let mut state = self.token.lock().await;
        state.access_token.clear();
        state.expires_at = DateTime::<Utc>::MIN_UTC;
    }
}

#[async_trait]
impl Transport for OAuthTransport {
    async fn post(&self, xml: &str) -> Result<String, ApiError> {
        let token = self.access_token().await?;

        tracing::debug!("POST {} ({} bytes)", self.api_endpoint, xml.len());
        let response = self
            .client
            .post(&self.api_endpoint)
            .bearer_auth(token)
            .form(&[("xml", xml)])
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("XML API request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Forces a fresh token on the next call.
            self.invalidate_token().await;
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("XML API returned {}", status);
            return Err(ApiError::Transport(format!(
                "XML API returned {}: {}",
                status, error_text
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read XML API response: {}", e)))
    }
}

impl std::fmt::Debug for OAuthTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTransport")
            .field("api_endpoint", &self.api_endpoint)
            .field("oauth_endpoint", &self.oauth_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(expires_in: i64) -> TokenState {
        TokenState {
            access_token: "abc".to_string(),
            expires_at: Utc::now() + TimeDelta::seconds(expires_in),
            refresh_token: "r".to_string(),
        }
    }

    #[test]
    fn test_token_freshness_honors_margin() {
        let now = Utc::now();
        assert!(state(3600).is_fresh(now));
        assert!(!state(10).is_fresh(now));
        assert!(!state(-5).is_fresh(now));
    }

    #[test]
    fn test_empty_token_is_never_fresh() {
        let mut token = state(3600);
        token.access_token.clear();
        assert!(!token.is_fresh(Utc::now()));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config {
            client_id: "id".to_string(),
            client_secret: "hunter2".to_string(),
            refresh_token: "refresh".to_string(),
            server_number: 5,
            base_url: None,
            timeout_secs: 5,
        };
        let transport = OAuthTransport::new(&config).unwrap();
        let rendered = format!("{:?}", transport);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("api5.ibmmarketingcloud.com"));
    }
}
