use colored::{control, ColoredString, Colorize};

use crate::core::formatter::{
    format_calories, format_clock_time, format_liters, format_macro, format_sparkline,
};
use crate::core::models::body::{SleepEntry, WeightEntry};
use crate::core::models::permission::AuthorizationState;
use crate::core::models::snapshot::{MealSummary, NutritionSnapshot};
use crate::core::poller::{Phase, PollerState};
use crate::core::weekly::recent_weights;

const SLEEP_ROWS: usize = 7;

/// Render the poller state as a colored (or plain) block.
///
/// Layout:
/// ```text
///  Today's Nutrition (granted)
///   Calories  450 kcal
///   Protein   30.0g   Fat 10.0g   Carbs 40.0g
///   Water     0.50 L
///
///  Meals
///   Lunch  12:30:00 PM
///     450 kcal  P 30.0g  F 10.0g  C 40.0g
///     Fiber: 5.0g
/// ```
pub fn render_state(state: &PollerState, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    let auth = color_authorization(&state.authorization);
    let header = if state.is_loading {
        format!(" Today's Nutrition ({}, refreshing)", auth)
    } else {
        format!(" Today's Nutrition ({})", auth)
    };
    lines.push(header.bold().to_string());

    if state.phase == Phase::Denied {
        lines.push(format!(
            "  {}",
            "Type `retry` after granting access, or `open` for settings.".dimmed()
        ));
        return lines.join("\n");
    }

    render_snapshot_lines(&mut lines, &state.snapshot);
    lines.join("\n")
}

/// Render a bare snapshot, as printed by one-shot commands.
pub fn render_snapshot(snapshot: &NutritionSnapshot, use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines = vec![" Today's Nutrition".bold().to_string()];
    render_snapshot_lines(&mut lines, snapshot);
    lines.join("\n")
}

fn render_snapshot_lines(lines: &mut Vec<String>, snapshot: &NutritionSnapshot) {
    // Placeholders until the first cycle lands
    let known = !snapshot.is_empty();
    let totals = &snapshot.totals;
    let value = |v: f64| known.then_some(v);

    lines.push(format!(
        "  {}  {}",
        "Calories".cyan(),
        format_calories(value(totals.calories)).bold()
    ));
    lines.push(format!(
        "  {}   {}   {} {}   {} {}",
        "Protein".cyan(),
        format_macro(value(totals.protein)),
        "Fat".cyan(),
        format_macro(value(totals.fat)),
        "Carbs".cyan(),
        format_macro(value(totals.carbs)),
    ));
    lines.push(format!(
        "  {}     {}",
        "Water".cyan(),
        format_liters(value(totals.water))
    ));

    if let Some(fetched_at) = &snapshot.fetched_at {
        let local = fetched_at.with_timezone(&chrono::Local);
        lines.push(
            format!("  Updated {}", format_clock_time(&local))
                .dimmed()
                .to_string(),
        );
    }

    if !known {
        return;
    }

    lines.push(String::new());
    if snapshot.meals.is_empty() {
        lines.push(format!("  {}", "No meals logged today".dimmed()));
        return;
    }
    lines.push(" Meals".bold().to_string());
    for meal in &snapshot.meals {
        render_meal(lines, meal);
    }
}

fn render_meal(lines: &mut Vec<String>, meal: &MealSummary) {
    lines.push(format!("  {}  {}", meal.name.bold(), meal.time.dimmed()));
    lines.push(format!(
        "    {}  P {}  F {}  C {}",
        format_calories(Some(meal.calories)),
        format_macro(Some(meal.protein)),
        format_macro(Some(meal.fat)),
        format_macro(Some(meal.carbs)),
    ));
    if !meal.nutrients.is_empty() {
        lines.push(format!("    {}", meal.nutrients.join("  ").dimmed()));
    }
}

fn color_authorization(state: &AuthorizationState) -> ColoredString {
    let text = state.to_string();
    match state {
        AuthorizationState::Granted => text.green(),
        AuthorizationState::Denied(_) => text.red(),
        AuthorizationState::Unchecked => text.dimmed(),
    }
}

/// Weight history with the last-seven-entries trend line.
pub fn render_weights(history: &[WeightEntry], use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines = vec![" Weight".bold().to_string()];

    let Some(latest) = history.first() else {
        lines.push(format!("  {}", "No weight entries yet".dimmed()));
        return lines.join("\n");
    };

    lines.push(format!(
        "  {}    {:.1} {}",
        "Latest".cyan(),
        latest.weight,
        latest.unit.id()
    ));
    lines.push(format!(
        "  {}     {}",
        "Trend".cyan(),
        format_sparkline(&recent_weights(history)).magenta()
    ));
    lines.push(String::new());
    for entry in history {
        lines.push(format!(
            "  {:<12} {:.1} {}",
            entry.date.get(..10).unwrap_or(&entry.date),
            entry.weight,
            entry.unit.id()
        ));
    }
    lines.join("\n")
}

/// Most recent nights of sleep.
pub fn render_sleep(history: &[SleepEntry], use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines = vec![" Sleep".bold().to_string()];
    if history.is_empty() {
        lines.push(format!("  {}", "No sleep entries yet".dimmed()));
        return lines.join("\n");
    }
    for entry in history.iter().take(SLEEP_ROWS) {
        lines.push(format!(
            "  {:<12} {} {} {} {}",
            entry.date,
            "slept".cyan(),
            entry.sleep_time,
            "woke".cyan(),
            entry.wake_time
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::body::WeightUnit;
    use crate::core::models::permission::DenialReason;
    use crate::core::models::snapshot::NutritionTotals;
    use chrono::Utc;

    fn lunch_snapshot() -> NutritionSnapshot {
        NutritionSnapshot {
            totals: NutritionTotals {
                calories: 450.0,
                protein: 30.0,
                fat: 10.0,
                carbs: 40.0,
                fiber: 5.0,
                water: 0.5,
                ..NutritionTotals::default()
            },
            meals: vec![MealSummary {
                name: "Lunch".to_string(),
                time: "12:30:00 PM".to_string(),
                calories: 450.0,
                protein: 30.0,
                fat: 10.0,
                carbs: 40.0,
                nutrients: vec!["Fiber: 5.0g".to_string()],
            }],
            window: None,
            fetched_at: Some(Utc::now()),
        }
    }

    #[test]
    fn render_contains_totals_and_meals() {
        let state = PollerState {
            phase: Phase::Polling,
            authorization: AuthorizationState::Granted,
            snapshot: lunch_snapshot(),
            is_loading: false,
        };
        let output = render_state(&state, false);
        assert!(output.contains("granted"));
        assert!(output.contains("450 kcal"));
        assert!(output.contains("0.50 L"));
        assert!(output.contains("Lunch"));
        assert!(output.contains("Fiber: 5.0g"));
    }

    #[test]
    fn render_placeholders_before_first_cycle() {
        let output = render_state(&PollerState::default(), false);
        assert!(output.contains("— kcal"));
        assert!(!output.contains("Meals"));
    }

    #[test]
    fn render_denied_shows_reason_and_hint() {
        let state = PollerState {
            phase: Phase::Denied,
            authorization: AuthorizationState::Denied(DenialReason::Unavailable(None)),
            ..PollerState::default()
        };
        let output = render_state(&state, false);
        assert!(output.contains("denied (unavailable)"));
        assert!(output.contains("retry"));
    }

    #[test]
    fn render_loading_marker() {
        let state = PollerState {
            is_loading: true,
            ..PollerState::default()
        };
        assert!(render_state(&state, false).contains("refreshing"));
    }

    #[test]
    fn render_no_ansi_when_color_false() {
        let output = render_snapshot(&lunch_snapshot(), false);
        assert!(!output.contains('\x1b'), "output should not contain ANSI codes");
    }

    #[test]
    fn render_weights_latest_first() {
        let history = vec![
            WeightEntry {
                id: "2".to_string(),
                weight: 79.5,
                unit: WeightUnit::Kg,
                date: "2025-03-02T08:00:00+00:00".to_string(),
            },
            WeightEntry {
                id: "1".to_string(),
                weight: 80.0,
                unit: WeightUnit::Kg,
                date: "2025-03-01T08:00:00+00:00".to_string(),
            },
        ];
        let output = render_weights(&history, false);
        assert!(output.contains("Latest    79.5 kg"));
        assert!(output.contains("2025-03-01"));
    }

    #[test]
    fn render_empty_histories() {
        assert!(render_weights(&[], false).contains("No weight entries"));
        assert!(render_sleep(&[], false).contains("No sleep entries"));
    }

    #[test]
    fn render_sleep_rows() {
        let history = vec![SleepEntry {
            date: "2025-03-01".to_string(),
            sleep_time: "10:30 PM".to_string(),
            wake_time: "6:45 AM".to_string(),
        }];
        let output = render_sleep(&history, false);
        assert!(output.contains("10:30 PM"));
        assert!(output.contains("6:45 AM"));
    }
}
