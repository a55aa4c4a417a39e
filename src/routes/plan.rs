// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training plan view and reload.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::models::PlanSchedule;
use crate::services::reconcile;
use crate::{today, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plan", get(get_plan))
        .route("/api/plan/reload", post(reload_plan))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlanResponse {
    pub name: Option<String>,
    pub goal_km: Option<f64>,
    #[serde(flatten)]
    pub schedule: PlanSchedule,
}

/// Schedule from yesterday onward with logged distances.
async fn get_plan(State(state): State<Arc<AppState>>) -> Result<Json<PlanResponse>> {
    let plan = state.plan();
    let runs = state.ledger.list_all().await?;

    Ok(Json(PlanResponse {
        name: plan.name().map(str::to_string),
        goal_km: plan.goal_km(),
        schedule: reconcile::plan_schedule(&plan, &runs, today()),
    }))
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub entries: usize,
    pub planned_days: usize,
    pub total_planned_km: f64,
}

/// Re-read the plan document; the previous plan stays active on failure.
async fn reload_plan(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>> {
    let plan = state.reload_plan()?;
    Ok(Json(ReloadResponse {
        entries: plan.len(),
        planned_days: plan.planned_days(),
        total_planned_km: plan.total_planned(),
    }))
}
