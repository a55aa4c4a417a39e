// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training plan loading and lookup.
//!
//! The plan is a YAML document mapping ISO dates to target distances:
//!
//! ```yaml
//! name: Serpent Trail 50k
//! goal_km: 50
//! schedule:
//!   2025-01-20: 5
//!   2025-01-21: 8
//! ```
//!
//! Dates absent from the schedule are rest days (target 0). Any malformed
//! entry fails the whole load.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufRead;
use std::path::Path;

use crate::models::PlanEntry;
use crate::time_utils::parse_iso_date;

/// On-disk plan document.
#[derive(Deserialize)]
struct PlanDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    goal_km: Option<f64>,
    schedule: serde_yaml::Mapping,
}

/// Serialized form written by [`PlanStore::to_yaml`].
#[derive(Serialize)]
struct PlanDocumentOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal_km: Option<f64>,
    schedule: BTreeMap<String, f64>,
}

/// Read-only, date-indexed training plan.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlanStore {
    name: Option<String>,
    goal_km: Option<f64>,
    targets: BTreeMap<NaiveDate, f64>,
}

impl PlanStore {
    /// Load a plan from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| PlanError::Io(format!("{}: {}", path.display(), e)))?;
        Self::load_from_yaml(&yaml)
    }

    /// Load a plan from a YAML string.
    pub fn load_from_yaml(yaml: &str) -> Result<Self, PlanError> {
        let doc: PlanDocument =
            serde_yaml::from_str(yaml).map_err(|e| PlanError::Parse(e.to_string()))?;

        let mut entries = Vec::with_capacity(doc.schedule.len());
        for (key, value) in &doc.schedule {
            let date = key
                .as_str()
                .and_then(parse_iso_date)
                .ok_or_else(|| PlanError::InvalidDate(yaml_scalar(key)))?;
            let target_km = value.as_f64().ok_or_else(|| PlanError::InvalidTarget {
                date,
                value: yaml_scalar(value),
            })?;
            entries.push(PlanEntry { date, target_km });
        }

        let mut store = Self::from_entries(entries)?;
        store.name = doc.name;
        store.goal_km = doc.goal_km;

        tracing::info!(
            entries = store.len(),
            planned_days = store.planned_days(),
            total_km = store.total_planned(),
            "Loaded training plan"
        );
        Ok(store)
    }

    /// Build a plan from explicit entries, validating each one.
    pub fn from_entries<I>(entries: I) -> Result<Self, PlanError>
    where
        I: IntoIterator<Item = PlanEntry>,
    {
        let mut targets = BTreeMap::new();
        for entry in entries {
            if !entry.target_km.is_finite() || entry.target_km < 0.0 {
                return Err(PlanError::InvalidTarget {
                    date: entry.date,
                    value: entry.target_km.to_string(),
                });
            }
            if targets.insert(entry.date, entry.target_km).is_some() {
                return Err(PlanError::DuplicateDate(entry.date));
            }
        }
        Ok(Self {
            name: None,
            goal_km: None,
            targets,
        })
    }

    /// Target for `date`, 0 for dates not in the plan.
    pub fn target_for(&self, date: NaiveDate) -> f64 {
        self.entry_for(date).unwrap_or(0.0)
    }

    /// Target for `date`, `None` for dates not in the plan.
    pub fn entry_for(&self, date: NaiveDate) -> Option<f64> {
        self.targets.get(&date).copied()
    }

    /// Plan entries with `start <= date <= end`, in date order.
    pub fn targets_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = PlanEntry> + '_ {
        let range = if start <= end {
            Some(self.targets.range(start..=end))
        } else {
            None
        };
        range
            .into_iter()
            .flatten()
            .map(|(&date, &target_km)| PlanEntry { date, target_km })
    }

    /// All entries in date order.
    pub fn entries(&self) -> impl Iterator<Item = PlanEntry> + '_ {
        self.targets
            .iter()
            .map(|(&date, &target_km)| PlanEntry { date, target_km })
    }

    /// Sum of all targets across the plan.
    pub fn total_planned(&self) -> f64 {
        self.targets.values().sum()
    }

    /// Number of days with a non-zero target.
    pub fn planned_days(&self) -> usize {
        self.targets.values().filter(|&&t| t > 0.0).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.targets.keys().next().copied()
    }

    /// Last date of the plan (race day).
    pub fn race_day(&self) -> Option<NaiveDate> {
        self.targets.keys().next_back().copied()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn goal_km(&self) -> Option<f64> {
        self.goal_km
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Set the display name and goal distance.
    pub fn with_metadata(mut self, name: Option<String>, goal_km: Option<f64>) -> Self {
        self.name = name;
        self.goal_km = goal_km;
        self
    }

    /// Serialize back into the YAML plan document format.
    pub fn to_yaml(&self) -> Result<String, PlanError> {
        let doc = PlanDocumentOut {
            name: self.name.as_deref(),
            goal_km: self.goal_km,
            schedule: self
                .targets
                .iter()
                .map(|(date, &target)| (date.format("%Y-%m-%d").to_string(), target))
                .collect(),
        };
        serde_yaml::to_string(&doc).map_err(|e| PlanError::Parse(e.to_string()))
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}

// ─── CSV Import ──────────────────────────────────────────────

/// Result of converting a CSV plan.
#[derive(Debug)]
pub struct CsvImport {
    pub plan: PlanStore,
    /// Rows that could not be used: (1-based line number, reason)
    pub skipped: Vec<(usize, String)>,
}

/// Convert a CSV training plan into a [`PlanStore`].
///
/// The header must name a `Date` and a `Target_km` column; other columns are
/// ignored. Rows with an unparseable date or target are reported in
/// [`CsvImport::skipped`]. When a date repeats, the last row wins.
pub fn import_csv<R: BufRead>(reader: R) -> Result<CsvImport, PlanError> {
    let mut rows = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rows
        .headers()
        .map_err(|e| PlanError::Parse(format!("CSV header: {}", e)))?
        .clone();
    if headers.is_empty() {
        return Err(PlanError::Parse("CSV file is empty".to_string()));
    }
    let column = |name: &str| {
        headers
            .iter()
            .position(|c| c.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| PlanError::Parse(format!("CSV header is missing column {:?}", name)))
    };
    let date_col = column("Date")?;
    let target_col = column("Target_km")?;

    let mut targets = BTreeMap::new();
    let mut skipped = Vec::new();

    for record in rows.records() {
        let record = record.map_err(|e| PlanError::Parse(format!("CSV record: {}", e)))?;
        let line_no = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(str::is_empty) {
            continue;
        }

        let date = record.get(date_col).and_then(parse_iso_date);
        let target = record
            .get(target_col)
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0);

        match (date, target) {
            (Some(date), Some(target)) => {
                targets.insert(date, target);
            }
            (None, _) => skipped.push((line_no, "invalid date".to_string())),
            (_, None) => skipped.push((line_no, "invalid target".to_string())),
        }
    }

    let plan = PlanStore::from_entries(
        targets
            .into_iter()
            .map(|(date, target_km)| PlanEntry { date, target_km }),
    )?;
    Ok(CsvImport { plan, skipped })
}

/// Errors from plan operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Failed to read plan: {0}")]
    Io(String),

    #[error("Failed to parse plan: {0}")]
    Parse(String),

    #[error("Invalid plan date {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid target {value:?} for {date} (expected a non-negative number)")]
    InvalidTarget { date: NaiveDate, value: String },

    #[error("Plan lists {0} more than once")]
    DuplicateDate(NaiveDate),
}
