// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress views: public dashboard and chart, home summary, range stats.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::{verify_session_token, SESSION_COOKIE};
use crate::models::{ChartSeries, DailyStatus, Report, RunVsTarget, WeeklySummary};
use crate::services::reconcile;
use crate::{today, AppState};

/// Number of runs shown on the home page.
const RECENT_RUNS: u32 = 3;

/// Days offered for quick logging on the home page.
const LOG_WINDOW_DAYS: i64 = 7;

/// Routes visible without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/chart-data", get(chart_data))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/stats", get(stats))
}

fn has_session(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> bool {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
    });
    token.is_some_and(|t| verify_session_token(&t, &state.config.session_signing_key))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub total_runs: i64,
    pub total_distance_km: f64,
    pub avg_distance_km: f64,
    /// Every run, newest first
    pub runs: Vec<RunVsTarget>,
    /// Completed weeks with runs, newest first
    pub weekly_summaries: Vec<WeeklySummary>,
    pub authenticated: bool,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>> {
    let runs = state.ledger.list_all().await?;
    let (total_runs, total_distance_km) = state.ledger.totals().await?;
    let plan = state.plan();

    Ok(Json(DashboardResponse {
        total_runs,
        total_distance_km,
        avg_distance_km: if total_runs > 0 {
            total_distance_km / total_runs as f64
        } else {
            0.0
        },
        runs: reconcile::runs_vs_target(&plan, &runs),
        weekly_summaries: reconcile::completed_weeks(&plan, &runs, today()),
        authenticated: has_session(&state, &jar, &headers),
    }))
}

async fn chart_data(State(state): State<Arc<AppState>>) -> Result<Json<ChartSeries>> {
    let runs = state.ledger.list_all().await?;
    Ok(Json(reconcile::cumulative_series(
        &state.plan(),
        &runs,
        today(),
    )))
}

// ─── Home ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HomeResponse {
    pub today: NaiveDate,
    /// `None` when today is not in the plan
    pub today_target_km: Option<f64>,
    /// `None` when nothing is logged today
    pub today_km: Option<f64>,
    pub week: WeeklySummary,
    pub streak: u32,
    pub recent_runs: Vec<RunVsTarget>,
    /// Today and the previous six days, newest first
    pub log_window: Vec<DailyStatus>,
}

async fn home(State(state): State<Arc<AppState>>) -> Result<Json<HomeResponse>> {
    let today = today();
    let plan = state.plan();

    // Streak history starts at the plan's first day
    let start = plan
        .first_date()
        .unwrap_or(today)
        .min(today - Duration::days(LOG_WINDOW_DAYS - 1));
    let runs = state.ledger.list_between(start, today).await?;
    let days = reconcile::daily_statuses(&plan, &runs, start, today, today);

    let today_status = days.last().filter(|d| d.date == today);
    let log_window: Vec<DailyStatus> = days
        .iter()
        .rev()
        .take(LOG_WINDOW_DAYS as usize)
        .cloned()
        .collect();

    let recent = state.ledger.recent(RECENT_RUNS).await?;

    Ok(Json(HomeResponse {
        today,
        today_target_km: plan.entry_for(today),
        today_km: today_status
            .filter(|d| d.run_count > 0)
            .map(|d| d.actual_km),
        week: reconcile::current_week(&plan, &runs, today),
        streak: reconcile::streak(&days, today),
        recent_runs: reconcile::runs_vs_target(&plan, &recent),
        log_window,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StatsQuery {
    /// Defaults to the first day of the plan
    pub start: Option<NaiveDate>,
    /// Defaults to race day
    pub end: Option<NaiveDate>,
}

/// Reconciliation report for a date range (the whole plan by default).
async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Report>> {
    let today = today();
    let plan = state.plan();
    let start = query.start.or(plan.first_date()).unwrap_or(today);
    let end = query.end.or(plan.race_day()).unwrap_or(today);

    let runs = state.ledger.list_between(start, end).await?;
    Ok(Json(reconcile::report(&plan, &runs, start, end, today)?))
}
