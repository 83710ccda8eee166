use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::core::models::body::{DayEntry, WeeklyForm, WeightEntry, WeightUnit};

const WEEK_SECONDS: i64 = 7 * 24 * 60 * 60;
const CHART_POINTS: usize = 7;

/// 1-based week index of `now` relative to the first entry date.
/// Without a first entry date every entry belongs to week 1.
pub fn week_number(now: &DateTime<Utc>, first_entry_date: Option<NaiveDate>) -> u32 {
    let Some(first) = first_entry_date else {
        return 1;
    };
    let first = Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN));
    let elapsed = (*now - first).num_seconds().abs();
    (elapsed / WEEK_SECONDS) as u32 + 1
}

pub fn week_key(week: u32) -> String {
    format!("week{}", week)
}

pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

pub fn parse_entry_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()
}

/// Merge a weight reading into the form under `week<N>.<DayName>`.
///
/// Sets `firstEntryDate` on the first ever entry. Other days, other weeks and
/// unrelated fields on the same day are left untouched. Returns the week key.
pub fn record_weight(
    form: &mut WeeklyForm,
    weight: f64,
    unit: WeightUnit,
    now: &DateTime<Utc>,
) -> String {
    let first = match form.first_entry_date.as_deref().and_then(parse_entry_date) {
        Some(date) => date,
        None => {
            let today = now.date_naive();
            form.first_entry_date = Some(today.format("%Y-%m-%d").to_string());
            today
        }
    };

    let key = week_key(week_number(now, Some(first)));
    let day = day_name(now.with_timezone(&Local).weekday());

    let entry = form
        .weeks
        .entry(key.clone())
        .or_default()
        .entry(day.to_string())
        .or_insert_with(|| DayEntry {
            weight: None,
            weight_unit: None,
            extra: Default::default(),
        });
    entry.weight = Some(weight);
    entry.weight_unit = Some(unit);
    key
}

/// Last seven weights, oldest first, padded with the newest weight.
///
/// `history` is stored newest first.
pub fn recent_weights(history: &[WeightEntry]) -> Vec<f64> {
    let mut points: Vec<f64> = history
        .iter()
        .take(CHART_POINTS)
        .map(|e| e.weight)
        .collect();
    points.reverse();
    let pad = history.first().map(|e| e.weight).unwrap_or(0.0);
    while points.len() < CHART_POINTS {
        points.push(pad);
    }
    points
}
