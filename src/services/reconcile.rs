// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciliation of logged runs against the training plan.
//!
//! Everything here is a pure function of the plan, the runs and `today`.
//! Callers supply `today` so results are reproducible in tests.
//!
//! Dates absent from the plan are rest days (target 0).

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AppError, Result};
use crate::models::{
    ChartSeries, DailyStatus, DayStatus, PlanSchedule, Report, RunRecord, RunVsTarget,
    ScheduleDay, WeeklySummary,
};
use crate::services::plan::PlanStore;
use crate::time_utils::{round1, week_bounds};

/// Per-date totals of logged distance and run count.
#[derive(Debug, Default, Clone, Copy)]
struct DayTotal {
    km: f64,
    runs: u32,
}

fn totals_by_date<'a, I>(runs: I) -> BTreeMap<NaiveDate, DayTotal>
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    let mut totals: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for run in runs {
        let total = totals.entry(run.date).or_default();
        total.km += run.distance_km;
        total.runs += 1;
    }
    totals
}

fn dates_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Status of one day given its target and logged distance.
pub fn day_status(date: NaiveDate, target_km: f64, actual_km: f64, today: NaiveDate) -> DayStatus {
    if date > today {
        DayStatus::Future
    } else if target_km <= 0.0 {
        DayStatus::Rest
    } else if actual_km >= target_km {
        DayStatus::Met
    } else if actual_km > 0.0 {
        DayStatus::Partial
    } else {
        DayStatus::Missed
    }
}

/// One `DailyStatus` per date in `start..=end`. Multiple runs on a date are summed.
pub fn daily_statuses(
    plan: &PlanStore,
    runs: &[RunRecord],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Vec<DailyStatus> {
    let totals = totals_by_date(runs.iter().filter(|r| r.date >= start && r.date <= end));

    dates_inclusive(start, end)
        .map(|date| {
            let target_km = plan.target_for(date);
            let total = totals.get(&date).copied().unwrap_or_default();
            DailyStatus {
                date,
                target_km,
                actual_km: total.km,
                run_count: total.runs,
                status: day_status(date, target_km, total.km, today),
            }
        })
        .collect()
}

/// `actual / target` as a percentage, `None` when there is no target.
pub fn completion_percentage(actual_km: f64, target_km: f64) -> Option<f64> {
    if target_km > 0.0 {
        Some(actual_km / target_km * 100.0)
    } else {
        None
    }
}

fn summarize_week<'a, I>(week_start: NaiveDate, days: I) -> WeeklySummary
where
    I: IntoIterator<Item = &'a DailyStatus>,
{
    let iso = week_start.iso_week();
    let mut actual_km = 0.0;
    let mut target_km = 0.0;
    let mut days_logged = 0;
    for day in days {
        actual_km += day.actual_km;
        target_km += day.target_km;
        if day.run_count > 0 {
            days_logged += 1;
        }
    }

    WeeklySummary {
        iso_year: iso.year(),
        iso_week: iso.week(),
        week_start,
        week_end: week_start + Duration::days(6),
        actual_km,
        target_km,
        diff_km: (target_km > 0.0).then(|| actual_km - target_km),
        percentage: completion_percentage(actual_km, target_km),
        days_logged,
    }
}

/// Group daily statuses by ISO week, in date order.
///
/// Only the supplied days contribute, so a range that starts or ends
/// mid-week produces a partial first or last week.
pub fn weekly_summaries(days: &[DailyStatus]) -> Vec<WeeklySummary> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&DailyStatus>> = BTreeMap::new();
    for day in days {
        weeks.entry(week_bounds(day.date).0).or_default().push(day);
    }
    weeks
        .into_iter()
        .map(|(monday, days)| summarize_week(monday, days))
        .collect()
}

/// Consecutive met days walking backward from today (or the last day, if earlier).
///
/// Rest days neither count nor break the streak. Today is skipped while it is
/// still unmet; any earlier partial or missed day ends the walk.
pub fn streak(days: &[DailyStatus], today: NaiveDate) -> u32 {
    let mut count = 0;
    for day in days.iter().rev().filter(|d| d.date <= today) {
        match day.status {
            DayStatus::Met => count += 1,
            DayStatus::Rest | DayStatus::Future => {}
            DayStatus::Partial | DayStatus::Missed if day.date == today => {}
            DayStatus::Partial | DayStatus::Missed => break,
        }
    }
    count
}

/// Full reconciliation of `start..=end`.
pub fn report(
    plan: &PlanStore,
    runs: &[RunRecord],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<Report> {
    if start > end {
        return Err(AppError::Validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    let days = daily_statuses(plan, runs, start, end, today);
    let weeks = weekly_summaries(&days);
    let total_actual_km: f64 = days.iter().map(|d| d.actual_km).sum();
    let total_target_km: f64 = days.iter().map(|d| d.target_km).sum();
    let target_to_date_km = days
        .iter()
        .filter(|d| d.date <= today)
        .map(|d| d.target_km)
        .sum();

    Ok(Report {
        start,
        end,
        today,
        streak: streak(&days, today),
        overall_completion: completion_percentage(total_actual_km, total_target_km),
        total_actual_km,
        total_target_km,
        target_to_date_km,
        days,
        weeks,
    })
}

/// Summary of the Monday-Sunday week containing `today`.
pub fn current_week(plan: &PlanStore, runs: &[RunRecord], today: NaiveDate) -> WeeklySummary {
    let (monday, sunday) = week_bounds(today);
    let days = daily_statuses(plan, runs, monday, sunday, today);
    summarize_week(monday, &days)
}

/// Weeks before the current one that contain at least one run, newest first.
pub fn completed_weeks(
    plan: &PlanStore,
    runs: &[RunRecord],
    today: NaiveDate,
) -> Vec<WeeklySummary> {
    let (current_monday, _) = week_bounds(today);
    let mondays: BTreeSet<NaiveDate> = runs
        .iter()
        .map(|r| week_bounds(r.date).0)
        .filter(|monday| *monday < current_monday)
        .collect();

    mondays
        .into_iter()
        .rev()
        .map(|monday| {
            let sunday = monday + Duration::days(6);
            let days = daily_statuses(plan, runs, monday, sunday, today);
            summarize_week(monday, &days)
        })
        .collect()
}

/// Cumulative actual and target distance for each date up to today that has
/// a run or a plan entry.
pub fn cumulative_series(plan: &PlanStore, runs: &[RunRecord], today: NaiveDate) -> ChartSeries {
    let actual_by_date = totals_by_date(runs);
    let mut dates: Vec<NaiveDate> = actual_by_date
        .keys()
        .copied()
        .chain(plan.entries().map(|e| e.date))
        .filter(|d| *d <= today)
        .collect();
    dates.sort_unstable();
    dates.dedup();

    let mut series = ChartSeries::default();
    let mut actual = 0.0;
    let mut target = 0.0;
    for date in dates {
        actual += actual_by_date.get(&date).map_or(0.0, |t| t.km);
        target += plan.target_for(date);
        series.labels.push(date.format("%b %d").to_string());
        series.actual.push(round1(actual));
        series.target.push(round1(target));
    }
    series
}

/// Each run next to its date's target. The difference is only given for
/// non-zero targets.
pub fn runs_vs_target(plan: &PlanStore, runs: &[RunRecord]) -> Vec<RunVsTarget> {
    runs.iter()
        .map(|run| {
            let target_km = plan.entry_for(run.date);
            RunVsTarget {
                id: run.id,
                date: run.date,
                distance_km: run.distance_km,
                target_km,
                diff_km: target_km
                    .filter(|t| *t > 0.0)
                    .map(|t| run.distance_km - t),
                imported: run.is_imported(),
            }
        })
        .collect()
}

/// The plan from yesterday onward with logged distances, plus headline totals.
pub fn plan_schedule(plan: &PlanStore, runs: &[RunRecord], today: NaiveDate) -> PlanSchedule {
    let yesterday = today - Duration::days(1);
    let logged = totals_by_date(runs.iter().filter(|r| r.date >= yesterday));

    let schedule = plan
        .entries()
        .filter(|e| e.date >= yesterday)
        .map(|e| ScheduleDay {
            date: e.date,
            target_km: e.target_km,
            logged_km: logged.get(&e.date).map(|t| t.km),
            is_today: e.date == today,
            is_past: e.date < today,
        })
        .collect();

    let race_day = plan.race_day();
    PlanSchedule {
        today,
        schedule,
        total_run_km: runs.iter().map(|r| r.distance_km).sum(),
        total_planned_km: plan.total_planned(),
        race_day,
        days_remaining: race_day.map_or(0, |d| (d - today).num_days()),
    }
}
