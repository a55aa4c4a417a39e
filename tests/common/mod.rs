// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use chrono::NaiveDate;
use running_log::config::Config;
use running_log::db::SqliteDb;
use running_log::middleware::auth::create_session_token;
use running_log::models::PlanEntry;
use running_log::routes::create_router;
use running_log::services::PlanStore;
use running_log::AppState;
use std::sync::Arc;

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three-day plan: 5 km, 8 km, then a rest day.
#[allow(dead_code)]
pub fn sample_plan() -> PlanStore {
    PlanStore::from_entries([
        PlanEntry {
            date: date(2025, 1, 20),
            target_km: 5.0,
        },
        PlanEntry {
            date: date(2025, 1, 21),
            target_km: 8.0,
        },
        PlanEntry {
            date: date(2025, 1, 22),
            target_km: 0.0,
        },
    ])
    .unwrap()
}

/// Create a test app over a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), sample_plan()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with(
    config: Config,
    plan: PlanStore,
) -> (axum::Router, Arc<AppState>) {
    let db = SqliteDb::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = Arc::new(AppState::new(config, db, plan).expect("Failed to build state"));
    (create_router(state.clone()), state)
}

/// Config whose Strava endpoints point at a mock server.
#[allow(dead_code)]
pub fn config_for_mock(uri: &str) -> Config {
    let mut config = Config::test_default();
    config.strava_api_url = uri.to_string();
    config.strava_oauth_url = format!("{}/oauth", uri);
    config
}

#[allow(dead_code)]
pub fn session_token(state: &AppState) -> String {
    create_session_token(&state.config.session_signing_key).unwrap()
}

/// Build an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", session_token(state)),
        );
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
