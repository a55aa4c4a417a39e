// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod plan;
pub mod run;
pub mod stats;
pub mod token;

pub use plan::PlanEntry;
pub use run::{NewRun, RunRecord, RunSource, RunUpdate};
pub use stats::{
    ChartSeries, DailyStatus, DayStatus, PlanSchedule, Report, RunVsTarget, ScheduleDay,
    WeeklySummary,
};
pub use token::StravaToken;
