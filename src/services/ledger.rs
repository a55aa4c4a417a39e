// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run ledger: validated add/edit/delete/list over the run store.

use chrono::NaiveDate;

use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::models::{NewRun, RunRecord, RunUpdate};

/// Outcome of adding a run.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(RunRecord),
    /// A run with the same external ID is already in the ledger.
    Skipped,
}

/// The collection of logged runs.
#[derive(Clone)]
pub struct RunLedger {
    db: SqliteDb,
}

impl RunLedger {
    pub fn new(db: SqliteDb) -> Self {
        Self { db }
    }

    /// Add a run. A duplicate external ID is reported as `Skipped`, not an error.
    pub async fn add(&self, run: NewRun) -> Result<AddOutcome> {
        validate_distance(run.distance_km)?;
        validate_duration(run.duration_secs)?;

        if let Some(external_id) = run.external_id {
            if self.db.find_run_by_external_id(external_id).await?.is_some() {
                tracing::debug!(external_id, "Run already in ledger, skipping");
                return Ok(AddOutcome::Skipped);
            }
        }

        // The unique index catches a concurrent insert that passed the check above.
        match self.db.insert_run(&run).await? {
            Some(record) => {
                tracing::info!(
                    id = record.id,
                    date = %record.date,
                    distance_km = record.distance_km,
                    source = record.source.as_str(),
                    "Run added"
                );
                Ok(AddOutcome::Added(record))
            }
            None => Ok(AddOutcome::Skipped),
        }
    }

    /// Log a manual run, rejecting dates after `today`.
    pub async fn log_manual(
        &self,
        date: NaiveDate,
        distance_km: f64,
        duration_secs: Option<i64>,
        today: NaiveDate,
    ) -> Result<RunRecord> {
        validate_not_future(date, today)?;
        match self
            .add(NewRun::manual(date, distance_km, duration_secs))
            .await?
        {
            AddOutcome::Added(record) => Ok(record),
            AddOutcome::Skipped => Err(AppError::Internal(anyhow::anyhow!(
                "manual run without external ID was skipped"
            ))),
        }
    }

    /// Edit a manual run. Imported runs are rejected.
    pub async fn edit(&self, id: i64, update: RunUpdate, today: NaiveDate) -> Result<RunRecord> {
        let mut run = self.get(id).await?;
        if run.is_imported() {
            return Err(AppError::ImportedRun(id));
        }

        if let Some(date) = update.date {
            validate_not_future(date, today)?;
            run.date = date;
        }
        if let Some(distance_km) = update.distance_km {
            validate_distance(distance_km)?;
            run.distance_km = distance_km;
        }
        if let Some(duration_secs) = update.duration_secs {
            validate_duration(duration_secs)?;
            run.duration_secs = duration_secs;
        }

        if !self.db.update_run(&run).await? {
            return Err(not_found(id));
        }
        tracing::info!(id, date = %run.date, distance_km = run.distance_km, "Run updated");
        Ok(run)
    }

    /// Delete a manual run. Imported runs are rejected.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let run = self.get(id).await?;
        if run.is_imported() {
            return Err(AppError::ImportedRun(id));
        }
        if !self.db.delete_run(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(id, "Run deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<RunRecord> {
        self.db.get_run(id).await?.ok_or_else(|| not_found(id))
    }

    /// Runs with `start <= date <= end`, ordered by date.
    pub async fn list_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RunRecord>> {
        if start > end {
            return Err(AppError::Validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        self.db.list_runs_between(start, end).await
    }

    /// All runs, newest first.
    pub async fn list_all(&self) -> Result<Vec<RunRecord>> {
        self.db.list_runs().await
    }

    /// The `limit` most recent runs, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<RunRecord>> {
        self.db.list_recent_runs(i64::from(limit)).await
    }

    /// Number of runs and total distance in km.
    pub async fn totals(&self) -> Result<(i64, f64)> {
        self.db.run_totals().await
    }

    pub async fn contains_external_id(&self, external_id: i64) -> Result<bool> {
        Ok(self.db.find_run_by_external_id(external_id).await?.is_some())
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Run {}", id))
}

fn validate_distance(distance_km: f64) -> Result<()> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(AppError::Validation(format!(
            "distance must be a non-negative number, got {}",
            distance_km
        )));
    }
    Ok(())
}

fn validate_duration(duration_secs: Option<i64>) -> Result<()> {
    match duration_secs {
        Some(secs) if secs < 0 => Err(AppError::Validation(format!(
            "duration must be non-negative, got {}",
            secs
        ))),
        _ => Ok(()),
    }
}

fn validate_not_future(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(AppError::Validation(format!(
            "cannot log a run on {} (after today)",
            date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunSource;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    async fn ledger() -> RunLedger {
        RunLedger::new(SqliteDb::in_memory().await.unwrap())
    }

    fn imported(external_id: i64) -> NewRun {
        NewRun {
            date: date(20),
            distance_km: 10.0,
            duration_secs: Some(3000),
            external_id: Some(external_id),
            source: RunSource::Strava,
        }
    }

    #[tokio::test]
    async fn test_add_then_list_returns_record_unchanged() {
        let ledger = ledger().await;
        for (km, secs) in [(0.0, Some(0)), (5.0, Some(1650)), (42.195, None), (0.01, Some(1))] {
            let record = ledger
                .log_manual(date(20), km, secs, date(31))
                .await
                .unwrap();
            let listed = ledger.list_between(date(20), date(20)).await.unwrap();
            assert!(listed.contains(&record));
            assert_eq!(record.distance_km, km);
            assert_eq!(record.duration_secs, secs);
        }
    }

    #[tokio::test]
    async fn test_add_assigns_unique_ids() {
        let ledger = ledger().await;
        let a = ledger.log_manual(date(20), 5.0, None, date(31)).await.unwrap();
        let b = ledger.log_manual(date(20), 5.0, None, date(31)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_negative_values_rejected() {
        let ledger = ledger().await;
        let err = ledger
            .log_manual(date(20), -1.0, None, date(31))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = ledger
            .log_manual(date(20), 5.0, Some(-60), date(31))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = ledger
            .log_manual(date(20), f64::NAN, None, date(31))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_future_date_rejected() {
        let ledger = ledger().await;
        let err = ledger
            .log_manual(date(21), 5.0, None, date(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_external_id_skipped() {
        let ledger = ledger().await;
        assert!(matches!(
            ledger.add(imported(99)).await.unwrap(),
            AddOutcome::Added(_)
        ));
        assert_eq!(ledger.add(imported(99)).await.unwrap(), AddOutcome::Skipped);
        assert_eq!(ledger.totals().await.unwrap().0, 1);
    }

    #[tokio::test]
    async fn test_edit_manual_run() {
        let ledger = ledger().await;
        let run = ledger.log_manual(date(20), 5.0, None, date(31)).await.unwrap();

        let update = RunUpdate {
            distance_km: Some(6.5),
            duration_secs: Some(Some(2100)),
            ..Default::default()
        };
        let edited = ledger.edit(run.id, update, date(31)).await.unwrap();
        assert_eq!(edited.distance_km, 6.5);
        assert_eq!(edited.duration_secs, Some(2100));
        assert_eq!(edited.date, date(20));
        assert_eq!(ledger.get(run.id).await.unwrap(), edited);
    }

    #[tokio::test]
    async fn test_edit_and_delete_unknown_id() {
        let ledger = ledger().await;
        let err = ledger
            .edit(404, RunUpdate::default(), date(31))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(
            ledger.delete(404).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_imported_runs_are_read_only() {
        let ledger = ledger().await;
        let AddOutcome::Added(run) = ledger.add(imported(7)).await.unwrap() else {
            panic!("expected insert");
        };

        let update = RunUpdate {
            distance_km: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            ledger.edit(run.id, update, date(31)).await.unwrap_err(),
            AppError::ImportedRun(id) if id == run.id
        ));
        assert!(matches!(
            ledger.delete(run.id).await.unwrap_err(),
            AppError::ImportedRun(_)
        ));
        assert_eq!(ledger.get(run.id).await.unwrap().distance_km, 10.0);
    }

    #[tokio::test]
    async fn test_delete_manual_run() {
        let ledger = ledger().await;
        let run = ledger.log_manual(date(20), 5.0, None, date(31)).await.unwrap();
        ledger.delete(run.id).await.unwrap();
        assert!(ledger.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_between_rejects_reversed_range() {
        let ledger = ledger().await;
        assert!(matches!(
            ledger.list_between(date(22), date(20)).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
