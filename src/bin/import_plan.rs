// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Convert a CSV training plan into the YAML plan document.
//!
//! ```text
//! import-plan training_plan.csv -o config/plan.yaml --name "Autumn marathon"
//! ```
//!
//! The CSV needs a header with `Date` (YYYY-MM-DD) and `Target_km` columns.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, warn};

use running_log::services::plan::{import_csv, PlanStore};

#[derive(Parser)]
#[command(
    name = "import-plan",
    about = "Convert a CSV training plan to the YAML plan document"
)]
struct ImportArgs {
    /// CSV file with Date and Target_km columns
    input: PathBuf,

    /// Output YAML file
    #[arg(long, short = 'o', default_value = "config/plan.yaml")]
    output: PathBuf,

    /// Plan name stored in the document
    #[arg(long)]
    name: Option<String>,

    /// Overall distance goal in km
    #[arg(long)]
    goal_km: Option<f64>,

    /// Fail instead of skipping rows with invalid values
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = ImportArgs::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let import = import_csv(BufReader::new(file))?;

    for (line, reason) in &import.skipped {
        warn!(line, reason = %reason, "Skipping CSV row");
    }
    if args.strict && !import.skipped.is_empty() {
        anyhow::bail!("{} invalid row(s) in {}", import.skipped.len(), args.input.display());
    }

    let plan = import.plan.with_metadata(args.name, args.goal_km);
    let yaml = plan.to_yaml()?;

    // Make sure the result loads exactly as the server will load it
    let reloaded = PlanStore::load_from_yaml(&yaml)?;
    anyhow::ensure!(reloaded == plan, "Generated plan does not round-trip");

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&args.output, yaml)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        entries = plan.len(),
        planned_days = plan.planned_days(),
        total_km = plan.total_planned(),
        skipped = import.skipped.len(),
        output = %args.output.display(),
        "Training plan written"
    );
    Ok(())
}
