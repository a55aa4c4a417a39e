// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava connect/callback/disconnect and manual sync.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::strava::{unconfigured_status, StravaStatus};
use crate::services::SyncReport;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a connect attempt's state parameter stays valid (10 minutes).
pub const OAUTH_STATE_TTL_MILLIS: u128 = 10 * 60 * 1000;

/// Routes that need a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/strava/connect", get(connect))
        .route("/strava/disconnect", post(disconnect))
        .route("/strava/sync", post(sync))
        .route("/api/strava/status", get(status))
}

/// The OAuth callback. Strava redirects the browser here, so it is
/// authenticated by the signed state parameter instead of the session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/strava/callback", get(callback))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build a signed state parameter: base64url("timestamp_hex|signature_hex").
pub fn sign_oauth_state(secret: &[u8], timestamp_millis: u128) -> Result<String> {
    let payload = format!("{:x}", timestamp_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify the HMAC signature and age of an OAuth state parameter.
pub fn verify_oauth_state(state: &str, secret: &[u8], now_millis: u128) -> bool {
    let Some(timestamp) = decode_signed_timestamp(state, secret) else {
        tracing::warn!("OAuth state signature mismatch or malformed state");
        return false;
    };

    if timestamp > now_millis || now_millis - timestamp > OAUTH_STATE_TTL_MILLIS {
        tracing::warn!("OAuth state expired");
        return false;
    }
    true
}

fn decode_signed_timestamp(state: &str, secret: &[u8]) -> Option<u128> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let (timestamp_hex, signature_hex) = state_str.split_once('|')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(timestamp_hex.as_bytes());
    mac.verify_slice(&signature).ok()?;

    u128::from_str_radix(timestamp_hex, 16).ok()
}

/// Start OAuth flow - redirect to Strava authorization.
async fn connect(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let strava = state.strava()?;
    let oauth_state = sign_oauth_state(&state.config.session_signing_key, now_millis()?)?;
    let auth_url = strava.authorization_url(&state.config.strava_redirect_uri, &oauth_state);

    tracing::info!("Starting OAuth flow, redirecting to Strava");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn frontend_redirect(state: &AppState, query: &str) -> Redirect {
    let base = state.config.frontend_url.trim_end_matches('/');
    Redirect::temporary(&format!("{}/?{}", base, query))
}

/// OAuth callback - verify state, exchange code, store the credential and
/// run an initial sync.
async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let strava = state.strava()?;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Ok(frontend_redirect(
            &state,
            &format!("strava_error={}", urlencoding::encode(&error)),
        ));
    }

    let state_ok = params.state.as_deref().is_some_and(|s| {
        now_millis()
            .map(|now| verify_oauth_state(s, &state.config.session_signing_key, now))
            .unwrap_or(false)
    });
    if !state_ok {
        return Err(AppError::Validation(
            "invalid or expired OAuth state".to_string(),
        ));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let token = strava.handle_oauth_callback(&code).await?;

    let imported = match state.importer()?.sync(state.config.strava_sync_days).await {
        Ok(report) => report.imported,
        Err(e) => {
            tracing::warn!(
                error = %e,
                athlete_id = token.athlete_id,
                "Initial Strava sync failed, continuing anyway"
            );
            0
        }
    };

    Ok(frontend_redirect(
        &state,
        &format!("strava=connected&imported={}", imported),
    ))
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub disconnected: bool,
}

async fn disconnect(State(state): State<Arc<AppState>>) -> Result<Json<DisconnectResponse>> {
    let disconnected = state.strava()?.disconnect().await?;
    Ok(Json(DisconnectResponse { disconnected }))
}

#[derive(Deserialize, Validate)]
pub struct SyncQuery {
    /// Lookback window in days; defaults to the configured window
    #[validate(range(min = 1, max = 3650))]
    days: Option<u32>,
}

/// Manual sync trigger.
async fn sync(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncReport>> {
    query.validate()?;
    let days = query.days.unwrap_or(state.config.strava_sync_days);
    let report = state.importer()?.sync(days).await?;
    Ok(Json(report))
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StravaStatus>> {
    match &state.strava {
        Some(strava) => Ok(Json(strava.status().await?)),
        None => Ok(Json(unconfigured_status())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret_key";
    const NOW: u128 = 1_737_400_000_000;

    #[test]
    fn test_oauth_state_roundtrip() {
        let state = sign_oauth_state(SECRET, NOW).unwrap();
        assert!(verify_oauth_state(&state, SECRET, NOW));
        assert!(verify_oauth_state(&state, SECRET, NOW + 60_000));
    }

    #[test]
    fn test_oauth_state_expires() {
        let state = sign_oauth_state(SECRET, NOW).unwrap();
        assert!(!verify_oauth_state(
            &state,
            SECRET,
            NOW + OAUTH_STATE_TTL_MILLIS + 1
        ));
        // Timestamps from the future are rejected too
        assert!(!verify_oauth_state(&state, SECRET, NOW - 1));
    }

    #[test]
    fn test_oauth_state_wrong_secret() {
        let state = sign_oauth_state(SECRET, NOW).unwrap();
        assert!(!verify_oauth_state(&state, b"wrong_key", NOW));
    }

    #[test]
    fn test_oauth_state_tampered() {
        let state = sign_oauth_state(SECRET, NOW).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let (_, signature) = decoded.split_once('|').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(format!("{:x}|{}", NOW + 1, signature));
        assert!(!verify_oauth_state(&forged, SECRET, NOW + 1));
    }

    #[test]
    fn test_oauth_state_malformed() {
        assert!(!verify_oauth_state("not base64!", SECRET, NOW));
        let no_separator = URL_SAFE_NO_PAD.encode("deadbeef");
        assert!(!verify_oauth_state(&no_separator, SECRET, NOW));
    }
}
