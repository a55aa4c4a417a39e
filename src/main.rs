// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Running Log API Server
//!
//! Logs runs, imports them from Strava and reconciles them against a
//! training plan.

use running_log::{config::Config, db::SqliteDb, services::PlanStore, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Running Log API");

    // A broken plan is fatal: never serve with an empty or partial plan
    tracing::info!(path = %config.plan_path.display(), "Loading training plan");
    let plan = PlanStore::load_from_file(&config.plan_path).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to load training plan");
    })?;
    tracing::info!(
        entries = plan.len(),
        planned_days = plan.planned_days(),
        race_day = ?plan.race_day(),
        "Training plan loaded"
    );

    // Open the database and apply migrations
    let db = SqliteDb::new(&config.database_url).await?;
    tracing::info!(url = %config.database_url, "Database ready");

    let port = config.port;
    let state = Arc::new(AppState::new(config, db, plan)?);
    if state.strava.is_none() {
        tracing::warn!("STRAVA_CLIENT_ID/STRAVA_CLIENT_SECRET not set, Strava sync disabled");
    }

    // Build router
    let app = running_log::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("running_log=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
