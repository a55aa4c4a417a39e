// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Derived progress views produced by the reconciliation engine.
//!
//! Percentages are `Option<f64>`: `None` means "n/a" (no target to compare
//! against) and serializes as `null`.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Completion state of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// Logged distance reached the target
    Met,
    /// Something was logged, but less than the target
    Partial,
    /// Nothing logged against a non-zero target
    Missed,
    /// Target is zero (or the date is not in the plan)
    Rest,
    /// Date is after today
    Future,
}

/// Plan vs. actual for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyStatus {
    pub date: NaiveDate,
    pub target_km: f64,
    pub actual_km: f64,
    pub run_count: u32,
    pub status: DayStatus,
}

/// Plan vs. actual for one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklySummary {
    pub iso_year: i32,
    pub iso_week: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub actual_km: f64,
    pub target_km: f64,
    /// `actual - target`, `None` when the week has no target
    pub diff_km: Option<f64>,
    /// `actual / target * 100`, `None` ("n/a") when the target is zero
    pub percentage: Option<f64>,
    /// Distinct dates with at least one run
    pub days_logged: u32,
}

/// Full reconciliation of a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Report {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub today: NaiveDate,
    pub days: Vec<DailyStatus>,
    pub weeks: Vec<WeeklySummary>,
    pub streak: u32,
    pub total_actual_km: f64,
    pub total_target_km: f64,
    /// Target distance for dates up to and including today
    pub target_to_date_km: f64,
    /// `total_actual / total_target * 100`, `None` ("n/a") when the target is zero
    pub overall_completion: Option<f64>,
}

/// Cumulative actual vs. target series for charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub actual: Vec<f64>,
    pub target: Vec<f64>,
}

/// A logged run next to the plan target for its date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunVsTarget {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub date: NaiveDate,
    pub distance_km: f64,
    pub target_km: Option<f64>,
    /// `distance - target`, only when the target is non-zero
    pub diff_km: Option<f64>,
    pub imported: bool,
}

/// One row of the upcoming schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub target_km: f64,
    pub logged_km: Option<f64>,
    pub is_today: bool,
    pub is_past: bool,
}

/// The plan from yesterday onward plus headline totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlanSchedule {
    pub today: NaiveDate,
    pub schedule: Vec<ScheduleDay>,
    pub total_run_km: f64,
    pub total_planned_km: f64,
    pub race_day: Option<NaiveDate>,
    pub days_remaining: i64,
}
