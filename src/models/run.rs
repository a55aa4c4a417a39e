// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Logged run model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::{format_duration, format_pace};

/// Where a run record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum RunSource {
    Manual,
    Strava,
}

impl RunSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RunSource::Manual => "manual",
            RunSource::Strava => "strava",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "manual" => Some(RunSource::Manual),
            "strava" => Some(RunSource::Strava),
            _ => None,
        }
    }
}

/// Stored run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunRecord {
    /// Ledger-assigned identifier
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    /// Calendar date of the run
    pub date: NaiveDate,
    /// Distance in kilometres
    pub distance_km: f64,
    /// Moving time in seconds, if known
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub duration_secs: Option<i64>,
    /// Strava activity ID for imported runs
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub external_id: Option<i64>,
    pub source: RunSource,
    /// When the record was created (RFC3339)
    pub created_at: String,
}

impl RunRecord {
    /// Pace in seconds per km, derived from duration and distance.
    pub fn pace_secs_per_km(&self) -> Option<f64> {
        match self.duration_secs {
            Some(secs) if self.distance_km > 0.0 => Some(secs as f64 / self.distance_km),
            _ => None,
        }
    }

    /// Pace as `M:SS` per km.
    pub fn pace_formatted(&self) -> Option<String> {
        self.pace_secs_per_km().map(format_pace)
    }

    /// Duration as `M:SS` or `H:MM:SS`.
    pub fn duration_formatted(&self) -> Option<String> {
        self.duration_secs.map(format_duration)
    }

    pub fn is_imported(&self) -> bool {
        self.source == RunSource::Strava
    }
}

/// Input for a new ledger row (no id yet).
#[derive(Debug, Clone, PartialEq)]
pub struct NewRun {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub duration_secs: Option<i64>,
    pub external_id: Option<i64>,
    pub source: RunSource,
}

impl NewRun {
    /// A manually logged run.
    pub fn manual(date: NaiveDate, distance_km: f64, duration_secs: Option<i64>) -> Self {
        Self {
            date,
            distance_km,
            duration_secs,
            external_id: None,
            source: RunSource::Manual,
        }
    }
}

/// Editable fields of a manual run. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunUpdate {
    pub date: Option<NaiveDate>,
    pub distance_km: Option<f64>,
    pub duration_secs: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(distance_km: f64, duration_secs: Option<i64>) -> RunRecord {
        RunRecord {
            id: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            distance_km,
            duration_secs,
            external_id: None,
            source: RunSource::Manual,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_pace_derived_from_duration() {
        let r = run(5.0, Some(1650));
        assert_eq!(r.pace_secs_per_km(), Some(330.0));
        assert_eq!(r.pace_formatted().as_deref(), Some("5:30"));
    }

    #[test]
    fn test_pace_missing_without_duration_or_distance() {
        assert_eq!(run(5.0, None).pace_secs_per_km(), None);
        assert_eq!(run(0.0, Some(600)).pace_secs_per_km(), None);
    }

    #[test]
    fn test_duration_formatted() {
        assert_eq!(run(10.0, Some(3725)).duration_formatted().as_deref(), Some("1:02:05"));
        assert_eq!(run(10.0, None).duration_formatted(), None);
    }

    #[test]
    fn test_source_roundtrip() {
        for source in [RunSource::Manual, RunSource::Strava] {
            assert_eq!(RunSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(RunSource::parse("garmin"), None);
    }
}
