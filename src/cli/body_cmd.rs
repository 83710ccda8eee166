use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::cli::output::{print_json, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::formatter::normalize_clock;
use crate::core::models::body::{WeightEntry, WeightUnit};
use crate::core::store::LocalStore;
use crate::core::weekly::recent_weights;

#[derive(Serialize)]
struct WeightLogged<'a> {
    entry: &'a WeightEntry,
    week: &'a str,
}

pub fn log_weight(value: &str, unit: &str, opts: &OutputOptions) -> Result<()> {
    let weight: f64 = value
        .trim()
        .parse()
        .ok()
        .filter(|w: &f64| w.is_finite() && *w > 0.0)
        .ok_or_else(|| anyhow::anyhow!("Please enter a valid weight, got '{}'", value))?;
    let unit = WeightUnit::from_id(unit)
        .ok_or_else(|| anyhow::anyhow!("Unknown unit: '{}' (must be kg or lbs)", unit))?;

    let store = LocalStore::open_default();
    debug!(store = %store.root().display(), "logging weight");
    let (entry, week) = store
        .add_weight(weight, unit, Utc::now())
        .context("Failed to save weight")?;

    match opts.format {
        OutputFormat::Json => print_json(&WeightLogged { entry: &entry, week: &week }, opts)?,
        OutputFormat::Text => println!(
            "Weight logged: {:.1} {} ({})",
            entry.weight,
            entry.unit.id(),
            week
        ),
    }
    Ok(())
}

pub fn show_weights(opts: &OutputOptions) -> Result<()> {
    let history = LocalStore::open_default()
        .weight_history()
        .context("Failed to load weight history")?;
    match opts.format {
        OutputFormat::Json => print_json(
            &serde_json::json!({
                "history": history,
                "recent": recent_weights(&history),
            }),
            opts,
        )?,
        OutputFormat::Text => println!("{}", renderer::render_weights(&history, opts.use_color)),
    }
    Ok(())
}

pub fn log_sleep(sleep: &str, wake: &str, opts: &OutputOptions) -> Result<()> {
    let sleep_time = normalize_clock(sleep)
        .ok_or_else(|| anyhow::anyhow!("Invalid sleep time '{}' (expected h:mm AM)", sleep))?;
    let wake_time = normalize_clock(wake)
        .ok_or_else(|| anyhow::anyhow!("Invalid wake time '{}' (expected h:mm AM)", wake))?;

    let entry = LocalStore::open_default()
        .add_sleep(&sleep_time, &wake_time, Utc::now())
        .context("Failed to save sleep data")?;

    match opts.format {
        OutputFormat::Json => print_json(&entry, opts)?,
        OutputFormat::Text => println!(
            "Sleep logged for {}: {} to {}",
            entry.date, entry.sleep_time, entry.wake_time
        ),
    }
    Ok(())
}

pub fn show_sleep(opts: &OutputOptions) -> Result<()> {
    let history = LocalStore::open_default()
        .sleep_history()
        .context("Failed to load sleep history")?;
    match opts.format {
        OutputFormat::Json => print_json(&history, opts)?,
        OutputFormat::Text => println!("{}", renderer::render_sleep(&history, opts.use_color)),
    }
    Ok(())
}
