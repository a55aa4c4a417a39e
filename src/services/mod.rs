// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod importer;
pub mod ledger;
pub mod plan;
pub mod reconcile;
pub mod strava;

pub use importer::{ActivityImporter, SyncReport};
pub use ledger::{AddOutcome, RunLedger};
pub use plan::{PlanError, PlanStore};
pub use strava::{StravaClient, StravaService, StravaStatus};
