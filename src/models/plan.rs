// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Training plan entry model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Target distance assigned to one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub date: NaiveDate,
    /// Target distance in kilometres (0 = rest day)
    pub target_km: f64,
}
