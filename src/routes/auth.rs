// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password login and logout.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use validator::Validate;

use crate::config::digest_password;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_token, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::SyncReport;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    /// Session token, also set as a cookie
    pub token: String,
    /// Result of the login-time Strava sync, if one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

/// Session cookie attributes. `Secure` only when the frontend is served over HTTPS.
fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn password_matches(state: &AppState, password: &str) -> bool {
    let digest = digest_password(password);
    digest[..].ct_eq(&state.config.password_digest[..]).into()
}

/// Check the password and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    request.validate()?;

    if !password_matches(&state, &request.password) {
        tracing::warn!("Login rejected: wrong password");
        return Err(AppError::Unauthorized);
    }

    let token = create_session_token(&state.config.session_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    tracing::info!("Login successful");

    let sync = login_sync(&state).await;

    Ok((
        jar.add(session_cookie(&state, token.clone())),
        Json(LoginResponse { token, sync }),
    ))
}

/// Best-effort sync on login. Failures are logged, never surfaced.
async fn login_sync(state: &AppState) -> Option<SyncReport> {
    let (Some(strava), Some(importer)) = (&state.strava, &state.importer) else {
        return None;
    };

    match strava.is_connected().await {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Could not check Strava connection on login");
            return None;
        }
    }

    match importer.sync(state.config.strava_sync_days).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(error = %e, "Login-time Strava sync failed");
            None
        }
    }
}

/// End the session by expiring the cookie, whether or not the request sent one.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut removal = session_cookie(&state, String::new());
    removal.make_removal();
    (jar.add(removal), StatusCode::NO_CONTENT)
}
