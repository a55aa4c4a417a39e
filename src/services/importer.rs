// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Imports running activities from Strava into the run ledger.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::MAX_SYNC_DAYS;
use crate::error::AppError;
use crate::models::{NewRun, RunSource};
use crate::services::ledger::{AddOutcome, RunLedger};
use crate::services::strava::StravaService;

/// Strava sport types that count as runs.
pub const RUNNING_SPORT_TYPES: &[&str] = &["Run", "TrailRun", "VirtualRun"];

/// Counts from one sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncReport {
    /// New runs added to the ledger
    pub imported: u32,
    /// Activities already in the ledger
    pub skipped: u32,
    /// Activities that could not be parsed or stored
    pub failed: u32,
}

/// Summary activity as returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: i64,
    /// Metres
    pub distance: f64,
    /// Seconds
    pub moving_time: i64,
    pub start_date_local: String,
}

/// Whether a raw activity is a run, judged by `sport_type` with the legacy
/// `type` field as fallback. Checked before the full parse so other sports
/// with unexpected shapes are ignored rather than counted as failures.
pub fn is_running_activity(raw: &serde_json::Value) -> bool {
    raw.get("sport_type")
        .and_then(serde_json::Value::as_str)
        .or_else(|| raw.get("type").and_then(serde_json::Value::as_str))
        .is_some_and(|t| RUNNING_SPORT_TYPES.contains(&t))
}

impl StravaActivitySummary {
    /// Calendar date of the local start time.
    pub fn local_date(&self) -> Option<NaiveDate> {
        let raw = self.start_date_local.trim_end_matches('Z');
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .map(|dt| dt.date())
            .ok()
            .or_else(|| crate::time_utils::parse_iso_date(raw.get(..10)?))
    }

    /// Convert to a ledger entry: km rounded to 2 decimals, moving time as duration.
    pub fn to_new_run(&self) -> Option<NewRun> {
        if !self.distance.is_finite() || self.distance < 0.0 || self.moving_time < 0 {
            return None;
        }
        Some(NewRun {
            date: self.local_date()?,
            distance_km: (self.distance / 10.0).round() / 100.0,
            duration_secs: Some(self.moving_time),
            external_id: Some(self.id),
            source: RunSource::Strava,
        })
    }
}

/// Pulls recent activities from Strava and adds new runs to the ledger.
#[derive(Clone)]
pub struct ActivityImporter {
    strava: StravaService,
    ledger: RunLedger,
}

impl ActivityImporter {
    pub fn new(strava: StravaService, ledger: RunLedger) -> Self {
        Self { strava, ledger }
    }

    /// Import running activities from the last `since_days` days.
    ///
    /// Credential and fetch failures abort before any row is written.
    /// Individual activities that fail to parse or store are counted as
    /// `failed` and do not stop the batch.
    pub async fn sync(&self, since_days: u32) -> Result<SyncReport, AppError> {
        let token = self.strava.get_valid_token().await?;
        let since_days = since_days.min(MAX_SYNC_DAYS);
        let after = (Utc::now() - Duration::days(i64::from(since_days))).timestamp();

        let activities = self
            .strava
            .fetch_activities_since(&token.access_token, after)
            .await?;

        let mut report = SyncReport::default();
        for raw in activities {
            if !is_running_activity(&raw) {
                continue;
            }

            let activity: StravaActivitySummary = match serde_json::from_value(raw.clone()) {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(
                        activity_id = ?raw.get("id"),
                        error = %e,
                        "Skipping unparseable Strava activity"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let Some(run) = activity.to_new_run() else {
                tracing::warn!(
                    activity_id = activity.id,
                    start_date_local = %activity.start_date_local,
                    "Skipping Strava activity with invalid values"
                );
                report.failed += 1;
                continue;
            };

            match self.ledger.add(run).await {
                Ok(AddOutcome::Added(_)) => report.imported += 1,
                Ok(AddOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(activity_id = activity.id, error = %e, "Failed to store Strava activity");
                    report.failed += 1;
                }
            }
        }

        self.strava.record_sync(Utc::now()).await?;
        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            since_days,
            "Strava sync complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(value: serde_json::Value) -> StravaActivitySummary {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_running_types() {
        for t in ["Run", "TrailRun", "VirtualRun"] {
            assert!(is_running_activity(&json!({ "id": 1, "sport_type": t })), "{t}");
        }
        assert!(!is_running_activity(&json!({ "id": 2, "sport_type": "Ride" })));
        assert!(!is_running_activity(&json!({ "id": 3 })));
    }

    #[test]
    fn test_legacy_type_field() {
        assert!(is_running_activity(&json!({ "id": 3, "type": "Run" })));
        // sport_type wins over the legacy field
        assert!(!is_running_activity(
            &json!({ "id": 4, "sport_type": "Walk", "type": "Run" })
        ));
    }

    #[test]
    fn test_conversion() {
        let a = activity(json!({
            "id": 42, "sport_type": "Run", "distance": 10234.7,
            "moving_time": 3125, "start_date_local": "2025-01-20T23:30:00Z"
        }));
        let run = a.to_new_run().unwrap();
        assert_eq!(run.distance_km, 10.23);
        assert_eq!(run.duration_secs, Some(3125));
        assert_eq!(run.date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(run.external_id, Some(42));
        assert_eq!(run.source, RunSource::Strava);
    }

    #[test]
    fn test_conversion_rejects_bad_date() {
        let a = activity(json!({
            "id": 42, "sport_type": "Run", "distance": 1000.0,
            "moving_time": 300, "start_date_local": "yesterday"
        }));
        assert!(a.to_new_run().is_none());
    }
}
