// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run CRUD routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::models::{RunRecord, RunSource, RunUpdate};
use crate::{today, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/runs", get(list_runs).post(create_run))
        .route(
            "/api/runs/{id}",
            get(get_run).put(update_run).delete(delete_run),
        )
}

/// A run as returned by the API, with derived pace and plan target.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub date: NaiveDate,
    pub distance_km: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub duration_secs: Option<i64>,
    pub duration: Option<String>,
    /// `M:SS` per km
    pub pace: Option<String>,
    pub source: RunSource,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub strava_activity_id: Option<i64>,
    pub target_km: Option<f64>,
}

impl RunResponse {
    fn new(run: RunRecord, target_km: Option<f64>) -> Self {
        Self {
            duration: run.duration_formatted(),
            pace: run.pace_formatted(),
            id: run.id,
            date: run.date,
            distance_km: run.distance_km,
            duration_secs: run.duration_secs,
            source: run.source,
            strava_activity_id: run.external_id,
            target_km,
        }
    }
}

fn respond(state: &AppState, runs: Vec<RunRecord>) -> Vec<RunResponse> {
    let plan = state.plan();
    runs.into_iter()
        .map(|run| {
            let target = plan.entry_for(run.date);
            RunResponse::new(run, target)
        })
        .collect()
}

// ─── List ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Runs between `start` and `end` in date order, or every run (newest
/// first) when no range is given.
async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<RunResponse>>> {
    let runs = match (range.start, range.end) {
        (None, None) => state.ledger.list_all().await?,
        (start, end) => {
            let today = today();
            state
                .ledger
                .list_between(start.unwrap_or(NaiveDate::MIN), end.unwrap_or(today))
                .await?
        }
    };
    Ok(Json(respond(&state, runs)))
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRunRequest {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "distance must be non-negative"))]
    pub distance_km: f64,
    #[validate(range(min = 0, message = "duration must be non-negative"))]
    pub duration_secs: Option<i64>,
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<RunResponse>)> {
    request.validate()?;
    let today = today();
    let run = state
        .ledger
        .log_manual(
            request.date.unwrap_or(today),
            request.distance_km,
            request.duration_secs,
            today,
        )
        .await?;

    let target = state.plan().entry_for(run.date);
    Ok((StatusCode::CREATED, Json(RunResponse::new(run, target))))
}

// ─── Get / Update / Delete ───────────────────────────────────

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RunResponse>> {
    let run = state.ledger.get(id).await?;
    let target = state.plan().entry_for(run.date);
    Ok(Json(RunResponse::new(run, target)))
}

/// Distinguish an absent field from an explicit `null`.
fn deserialize_present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRunRequest {
    pub date: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "distance must be non-negative"))]
    pub distance_km: Option<f64>,
    /// `null` clears the duration; omitted leaves it unchanged
    #[serde(default, deserialize_with = "deserialize_present")]
    pub duration_secs: Option<Option<i64>>,
}

impl From<UpdateRunRequest> for RunUpdate {
    fn from(request: UpdateRunRequest) -> Self {
        RunUpdate {
            date: request.date,
            distance_km: request.distance_km,
            duration_secs: request.duration_secs,
        }
    }
}

async fn update_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRunRequest>,
) -> Result<Json<RunResponse>> {
    request.validate()?;
    let run = state.ledger.edit(id, request.into(), today()).await?;
    let target = state.plan().entry_for(run.date);
    Ok(Json(RunResponse::new(run, target)))
}

async fn delete_run(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.ledger.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
