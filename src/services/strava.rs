// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and credential management.
//!
//! Handles:
//! - OAuth authorization URL, code exchange and deauthorization
//! - Activity listing (all pages within a lookback window)
//! - Token refresh when expired

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::StravaToken;

/// Page size for activity listing.
pub const ACTIVITIES_PER_PAGE: u32 = 50;

/// Upper bound on pages fetched in one sync (10,000 activities).
pub const MAX_ACTIVITY_PAGES: u32 = 200;

/// OAuth scope requested at connect time.
pub const OAUTH_SCOPE: &str = "activity:read_all";

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(
        client_id: String,
        client_secret: String,
        api_url: String,
        oauth_url: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            oauth_url: oauth_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        })
    }

    /// Build a client from configuration, `None` when no Strava credentials are set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(creds) = &config.strava else {
            return Ok(None);
        };
        Self::new(
            creds.client_id.clone(),
            creds.client_secret.clone(),
            config.strava_api_url.clone(),
            config.strava_oauth_url.clone(),
            Duration::from_secs(config.strava_timeout_secs),
        )
        .map(Some)
    }

    /// URL of the Strava consent page.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state),
        )
    }

    /// List one page of activities started after `after` (Unix timestamp).
    ///
    /// Entries are returned as raw JSON so a single malformed activity does
    /// not fail the whole page.
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let url = format!("{}/athlete/activities", self.api_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| request_error("Activity list", e))?;

        check_response_json(response).await
    }

    /// Walk activity pages until a short page. Running past `max_pages` is a
    /// fetch failure, so a listing that never ends imports nothing.
    pub async fn list_activities_since(
        &self,
        access_token: &str,
        after: i64,
        max_pages: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let mut activities = Vec::new();

        for page in 1..=max_pages {
            let batch = self
                .list_activities(access_token, after, page, ACTIVITIES_PER_PAGE)
                .await?;
            let len = batch.len();
            activities.extend(batch);

            tracing::debug!(page, count = len, "Fetched activity page");
            if len < ACTIVITIES_PER_PAGE as usize {
                return Ok(activities);
            }
        }

        tracing::warn!(max_pages, "Activity listing did not end within page limit");
        Err(AppError::RemoteFetch(format!(
            "Activity listing exceeded {} pages",
            max_pages
        )))
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| request_error("Token exchange", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::Credential(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RemoteFetch(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| request_error("Token refresh", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Strava token refresh rejected");
            return Err(AppError::Credential(format!(
                "Token refresh failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Credential(format!("Failed to parse refresh response: {}", e)))
    }

    /// Deauthorize the application, invalidating all tokens for the athlete.
    pub async fn deauthorize(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/deauthorize", self.oauth_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| request_error("Deauthorization", e))?;

        check_response(response).await?;
        tracing::info!("Strava deauthorization successful");
        Ok(())
    }
}

fn request_error(what: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::RemoteFetch(format!("{} request timed out", what))
    } else {
        AppError::RemoteFetch(format!("{} request failed: {}", what, err))
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!("Strava rate limit hit (429)");
        return Err(AppError::RemoteFetch("Strava rate limit exceeded".to_string()));
    }

    // Unauthorized - token revoked or expired
    if status.as_u16() == 401 {
        return Err(AppError::Credential(
            "Strava rejected the access token".to_string(),
        ));
    }

    Err(AppError::RemoteFetch(format!("HTTP {}: {}", status, body)))
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::RemoteFetch(format!("JSON parse error: {}", e)))
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: StravaAthlete,
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StravaAthlete {
    pub id: i64,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Connection state reported to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StravaStatus {
    pub configured: bool,
    pub connected: bool,
    pub athlete_id: Option<i64>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level Strava service that manages the stored credential and API calls.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    db: SqliteDb,
}

impl StravaService {
    pub fn new(client: StravaClient, db: SqliteDb) -> Self {
        Self { client, db }
    }

    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        self.client.authorization_url(redirect_uri, state)
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// The stored credential, refreshed first if it has expired.
    ///
    /// A missing credential or a failed refresh is a `Credential` error; the
    /// stored row is left untouched in that case.
    pub async fn get_valid_token(&self) -> Result<StravaToken, AppError> {
        let mut token = self
            .db
            .get_token()
            .await?
            .ok_or_else(|| AppError::Credential("Strava is not connected".to_string()))?;

        if !token.is_expired() {
            return Ok(token);
        }

        tracing::info!(athlete_id = token.athlete_id, "Access token expired, refreshing");
        let refreshed = self.client.refresh_token(&token.refresh_token).await?;

        token.access_token = refreshed.access_token;
        token.refresh_token = refreshed.refresh_token;
        token.expires_at = refreshed.expires_at;
        self.db.set_token(&token).await?;

        tracing::info!(athlete_id = token.athlete_id, "Token refreshed and stored");
        Ok(token)
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange the code for tokens and store them as the single credential.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<StravaToken, AppError> {
        let response = self.client.exchange_code(code).await?;

        let existing = self.db.get_token().await?;
        let token = StravaToken {
            athlete_id: response.athlete.id,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
            last_sync_at: existing
                .filter(|t| t.athlete_id == response.athlete.id)
                .and_then(|t| t.last_sync_at),
        };
        self.db.set_token(&token).await?;

        tracing::info!(
            athlete_id = token.athlete_id,
            firstname = response.athlete.firstname.as_deref().unwrap_or(""),
            "OAuth callback handled, token stored"
        );
        Ok(token)
    }

    /// Deauthorize at Strava (best effort) and delete the stored credential.
    ///
    /// Returns whether a credential was present. Logged runs are kept.
    pub async fn disconnect(&self) -> Result<bool, AppError> {
        let Some(token) = self.db.get_token().await? else {
            return Ok(false);
        };

        if let Err(e) = self.client.deauthorize(&token.access_token).await {
            tracing::warn!(
                error = %e,
                athlete_id = token.athlete_id,
                "Strava deauthorization failed, removing local credential anyway"
            );
        }

        self.db.delete_token().await?;
        tracing::info!(athlete_id = token.athlete_id, "Strava disconnected");
        Ok(true)
    }

    pub async fn is_connected(&self) -> Result<bool, AppError> {
        Ok(self.db.get_token().await?.is_some())
    }

    pub async fn status(&self) -> Result<StravaStatus, AppError> {
        let token = self.db.get_token().await?;
        Ok(StravaStatus {
            configured: true,
            connected: token.is_some(),
            athlete_id: token.as_ref().map(|t| t.athlete_id),
            token_expires_at: token.as_ref().map(|t| t.expires_at_utc()),
            last_sync_at: token.and_then(|t| t.last_sync_at),
        })
    }

    pub async fn record_sync(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        self.db.set_last_sync_at(at).await
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// Every activity started after `after`, fetched page by page until a
    /// short page. Nothing is returned unless all pages succeed.
    pub async fn fetch_activities_since(
        &self,
        access_token: &str,
        after: i64,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        self.client
            .list_activities_since(access_token, after, MAX_ACTIVITY_PAGES)
            .await
    }
}

/// Status when Strava credentials are not configured at all.
pub fn unconfigured_status() -> StravaStatus {
    StravaStatus {
        configured: false,
        connected: false,
        athlete_id: None,
        token_expires_at: None,
        last_sync_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StravaClient {
        StravaClient::new(
            "12345".to_string(),
            "secret".to_string(),
            "https://api.example.com/v3/".to_string(),
            "https://auth.example.com/oauth".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let url = client().authorization_url("http://localhost:8080/strava/callback", "abc.def");

        assert!(url.starts_with("https://auth.example.com/oauth/authorize?client_id=12345"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fstrava%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=activity%3Aread_all"));
        assert!(url.contains("state=abc.def"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(client().api_url, "https://api.example.com/v3");
    }

    #[tokio::test]
    async fn test_endless_listing_hits_page_limit() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        let full_page: Vec<serde_json::Value> = (0..ACTIVITIES_PER_PAGE)
            .map(|i| serde_json::json!({ "id": i }))
            .collect();

        Mock::given(method("GET"))
            .and(path("/athlete/activities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = StravaClient::new(
            "12345".to_string(),
            "secret".to_string(),
            mock_server.uri(),
            format!("{}/oauth", mock_server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client
            .list_activities_since("token", 0, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RemoteFetch(_)));
    }

    #[test]
    fn test_from_config_without_credentials() {
        let mut config = Config::test_default();
        config.strava = None;
        assert!(StravaClient::from_config(&config).unwrap().is_none());
    }
}
