use chrono::{DateTime, Local, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

use crate::core::formatter::{format_clock_time, format_grams, format_milligrams};
use crate::core::models::nutrition::{or_zero, present, HydrationRecord, NutritionRecord, RawRecord};
use crate::core::models::permission::RecordType;
use crate::core::models::snapshot::{MealSummary, NutritionSnapshot, NutritionTotals};
use crate::core::providers::{HealthProvider, ProviderError};
use crate::core::window::AggregationWindow;

const UNNAMED_MEAL: &str = "Unnamed meal";

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("reading {record_type} records: {source}")]
    Read {
        record_type: RecordType,
        #[source]
        source: ProviderError,
    },
    #[error("cycle aborted: {0}")]
    Aborted(String),
}

/// Fetch today's records and fold them into a fresh snapshot.
///
/// Both reads must succeed; any failure discards everything read so far.
pub async fn run_cycle(
    provider: &dyn HealthProvider,
    now: DateTime<Local>,
) -> Result<NutritionSnapshot, CycleError> {
    let window = AggregationWindow::today(&now);
    debug!(start = %window.start, end = %window.end, "fetching nutrition data");

    let meals = read(provider, RecordType::Nutrition, &window).await?;
    let water = read(provider, RecordType::Hydration, &window).await?;

    let mut snapshot = aggregate(meals.iter().chain(water.iter()), &Local);
    snapshot.window = Some(window);
    snapshot.fetched_at = Some(now.with_timezone(&Utc));
    debug!(
        calories = snapshot.totals.calories,
        meals = snapshot.meals.len(),
        water = snapshot.totals.water,
        "aggregated nutrition data"
    );
    Ok(snapshot)
}

async fn read(
    provider: &dyn HealthProvider,
    record_type: RecordType,
    window: &AggregationWindow,
) -> Result<Vec<RawRecord>, CycleError> {
    provider
        .read_records(record_type, window)
        .await
        .map_err(|source| CycleError::Read {
            record_type,
            source,
        })
}

/// Sum records into totals and per-meal summaries, keeping input order.
/// Meal times are rendered in `tz`.
pub fn aggregate<'a, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'a RawRecord>,
    tz: &Tz,
) -> NutritionSnapshot {
    let mut totals = NutritionTotals::default();
    let mut meals = Vec::new();

    for record in records {
        match record {
            RawRecord::Nutrition(meal) => meals.push(add_meal(&mut totals, meal, tz)),
            RawRecord::Hydration(drink) => add_hydration(&mut totals, drink),
        }
    }

    NutritionSnapshot {
        totals,
        meals,
        window: None,
        fetched_at: None,
    }
}

fn add_meal<Tz: TimeZone>(
    totals: &mut NutritionTotals,
    meal: &NutritionRecord,
    tz: &Tz,
) -> MealSummary {
    let calories = or_zero(meal.energy.as_ref().and_then(|e| e.kilocalories()));
    let protein = or_zero(meal.protein.as_ref().and_then(|m| m.grams()));
    let fat = or_zero(meal.total_fat.as_ref().and_then(|m| m.grams()));
    let carbs = or_zero(meal.total_carbohydrate.as_ref().and_then(|m| m.grams()));

    let mut nutrients = Vec::new();
    if let Some(fiber) = present(meal.dietary_fiber.as_ref().and_then(|m| m.grams())) {
        nutrients.push(format_grams("Fiber", fiber));
        totals.fiber += fiber;
    }
    if let Some(sugar) = present(meal.sugar.as_ref().and_then(|m| m.grams())) {
        nutrients.push(format_grams("Sugar", sugar));
        totals.sugar += sugar;
    }
    if let Some(sodium) = present(meal.sodium.as_ref().and_then(|m| m.milligrams())) {
        nutrients.push(format_milligrams("Sodium", sodium));
        totals.sodium += sodium;
    }

    totals.calories += calories;
    totals.protein += protein;
    totals.fat += fat;
    totals.carbs += carbs;

    MealSummary {
        name: meal
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNNAMED_MEAL.to_string()),
        time: format_clock_time(&meal.start_time.with_timezone(tz)),
        calories,
        protein,
        fat,
        carbs,
        nutrients,
    }
}

fn add_hydration(totals: &mut NutritionTotals, drink: &HydrationRecord) {
    totals.water += or_zero(drink.volume.as_ref().and_then(|v| v.liters()));
}
