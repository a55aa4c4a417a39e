// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Runs (the ledger of logged runs)
//! - Tokens (the single Strava OAuth credential)
//!
//! Schema lives in `migrations/` and is applied on connect.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::{NewRun, RunRecord, RunSource, StravaToken};
use crate::time_utils::format_utc_rfc3339;

const MAX_CONNECTIONS: u32 = 5;

/// SQLite database client.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

/// Raw `runs` row.
#[derive(FromRow)]
struct RunRow {
    id: i64,
    date: NaiveDate,
    distance_km: f64,
    duration_secs: Option<i64>,
    strava_activity_id: Option<i64>,
    source: String,
    created_at: String,
}

impl TryFrom<RunRow> for RunRecord {
    type Error = AppError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let source = RunSource::parse(&row.source).ok_or_else(|| {
            AppError::Database(format!("Run {} has unknown source {:?}", row.id, row.source))
        })?;
        Ok(RunRecord {
            id: row.id,
            date: row.date,
            distance_km: row.distance_km,
            duration_secs: row.duration_secs,
            external_id: row.strava_activity_id,
            source,
            created_at: row.created_at,
        })
    }
}

/// Raw `strava_tokens` row.
#[derive(FromRow)]
struct TokenRow {
    athlete_id: i64,
    access_token: String,
    refresh_token: String,
    expires_at: i64,
    last_sync_at: Option<String>,
}

impl From<TokenRow> for StravaToken {
    fn from(row: TokenRow) -> Self {
        StravaToken {
            athlete_id: row.athlete_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            last_sync_at: row
                .last_sync_at
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

const RUN_COLUMNS: &str =
    "id, date, distance_km, duration_secs, strava_activity_id, source, created_at";

fn collect_runs(rows: Vec<RunRow>) -> Result<Vec<RunRecord>, AppError> {
    rows.into_iter().map(RunRecord::try_from).collect()
}

impl SqliteDb {
    /// Connect to the database at `url` and apply pending migrations.
    pub async fn new(url: &str) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::info!(url, "Connected to SQLite");
        Ok(db)
    }

    /// Create a fresh in-memory database (for tests).
    ///
    /// Uses a single long-lived connection, since every new connection to
    /// `sqlite::memory:` would open a separate, empty database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    // ─── Run Operations ──────────────────────────────────────────

    /// Insert a run and return the stored record.
    ///
    /// Returns `Ok(None)` when the external ID is already present (the unique
    /// index rejected the row).
    pub async fn insert_run(&self, run: &NewRun) -> Result<Option<RunRecord>, AppError> {
        let now = format_utc_rfc3339(Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO runs (
                date, distance_km, duration_secs, strava_activity_id, source,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(run.date)
        .bind(run.distance_km)
        .bind(run.duration_secs)
        .bind(run.external_id)
        .bind(run.source.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Some(RunRecord {
                id: done.last_insert_rowid(),
                date: run.date,
                distance_km: run.distance_km,
                duration_secs: run.duration_secs,
                external_id: run.external_id,
                source: run.source,
                created_at: now,
            })),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a run by ID.
    pub async fn get_run(&self, id: i64) -> Result<Option<RunRecord>, AppError> {
        let row: Option<RunRow> =
            sqlx::query_as(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(RunRecord::try_from).transpose()
    }

    /// Get the run imported from a given Strava activity, if any.
    pub async fn find_run_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<RunRecord>, AppError> {
        let row: Option<RunRow> = sqlx::query_as(&format!(
            "SELECT {} FROM runs WHERE strava_activity_id = ?1",
            RUN_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RunRecord::try_from).transpose()
    }

    /// Overwrite the editable fields of a run. Returns false if the ID is unknown.
    pub async fn update_run(&self, run: &RunRecord) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET date = ?2, distance_km = ?3, duration_secs = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(run.id)
        .bind(run.date)
        .bind(run.distance_km)
        .bind(run.duration_secs)
        .bind(format_utc_rfc3339(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a run. Returns false if the ID is unknown.
    pub async fn delete_run(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM runs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Runs with `start <= date <= end`, oldest first.
    pub async fn list_runs_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RunRecord>, AppError> {
        let rows: Vec<RunRow> = sqlx::query_as(&format!(
            "SELECT {} FROM runs WHERE date >= ?1 AND date <= ?2 ORDER BY date, id",
            RUN_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        collect_runs(rows)
    }

    /// All runs, newest first.
    pub async fn list_runs(&self) -> Result<Vec<RunRecord>, AppError> {
        self.list_recent_runs(i64::MAX).await
    }

    /// The `limit` most recent runs, newest first.
    pub async fn list_recent_runs(&self, limit: i64) -> Result<Vec<RunRecord>, AppError> {
        let rows: Vec<RunRow> = sqlx::query_as(&format!(
            "SELECT {} FROM runs ORDER BY date DESC, id DESC LIMIT ?1",
            RUN_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        collect_runs(rows)
    }

    /// Number of runs and total distance.
    pub async fn run_totals(&self) -> Result<(i64, f64), AppError> {
        let totals: (i64, f64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(distance_km), 0.0) FROM runs")
                .fetch_one(&self.pool)
                .await?;
        Ok(totals)
    }

    // ─── Token Operations ────────────────────────────────────────

    /// Get the stored Strava credential.
    pub async fn get_token(&self) -> Result<Option<StravaToken>, AppError> {
        let row: Option<TokenRow> = sqlx::query_as(
            r#"
            SELECT athlete_id, access_token, refresh_token, expires_at, last_sync_at
            FROM strava_tokens WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StravaToken::from))
    }

    /// Store (insert or replace) the Strava credential.
    ///
    /// `last_sync_at` is kept when the same athlete reconnects or refreshes.
    pub async fn set_token(&self, token: &StravaToken) -> Result<(), AppError> {
        let now = format_utc_rfc3339(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO strava_tokens (
                id, athlete_id, access_token, refresh_token, expires_at,
                created_at, updated_at
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
                last_sync_at = CASE
                    WHEN strava_tokens.athlete_id = excluded.athlete_id
                    THEN strava_tokens.last_sync_at
                    ELSE NULL
                END,
                athlete_id = excluded.athlete_id,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(token.athlete_id)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete the Strava credential. Returns false if none was stored.
    pub async fn delete_token(&self) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM strava_tokens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the completion time of a successful sync.
    pub async fn set_last_sync_at(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE strava_tokens SET last_sync_at = ?1 WHERE id = 1")
            .bind(format_utc_rfc3339(at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
