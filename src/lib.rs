// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Running Log: track runs against a training plan.
//!
//! This crate provides the backend API for logging runs, importing them
//! from Strava, and reconciling them against a date-by-date training plan.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use chrono::NaiveDate;
use config::Config;
use db::SqliteDb;
use error::AppError;
use services::{ActivityImporter, PlanStore, RunLedger, StravaClient, StravaService};
use std::sync::{Arc, RwLock};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub ledger: RunLedger,
    /// `None` when Strava credentials are not configured
    pub strava: Option<StravaService>,
    pub importer: Option<ActivityImporter>,
    plan: RwLock<Arc<PlanStore>>,
}

impl AppState {
    /// Wire services together over an open database and a loaded plan.
    pub fn new(config: Config, db: SqliteDb, plan: PlanStore) -> Result<Self, AppError> {
        let ledger = RunLedger::new(db.clone());
        let strava = StravaClient::from_config(&config)?
            .map(|client| StravaService::new(client, db.clone()));
        let importer = strava
            .clone()
            .map(|strava| ActivityImporter::new(strava, ledger.clone()));

        Ok(Self {
            config,
            db,
            ledger,
            strava,
            importer,
            plan: RwLock::new(Arc::new(plan)),
        })
    }

    /// Snapshot of the current training plan.
    pub fn plan(&self) -> Arc<PlanStore> {
        self.plan
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-read the plan document. On failure the current plan stays in place.
    pub fn reload_plan(&self) -> Result<Arc<PlanStore>, AppError> {
        let plan = Arc::new(PlanStore::load_from_file(&self.config.plan_path)?);
        *self
            .plan
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = plan.clone();
        tracing::info!(
            path = %self.config.plan_path.display(),
            entries = plan.len(),
            "Training plan reloaded"
        );
        Ok(plan)
    }

    pub fn strava(&self) -> Result<&StravaService, AppError> {
        self.strava.as_ref().ok_or(AppError::StravaNotConfigured)
    }

    pub fn importer(&self) -> Result<&ActivityImporter, AppError> {
        self.importer.as_ref().ok_or(AppError::StravaNotConfigured)
    }
}

/// Today's date in the server's local time zone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
