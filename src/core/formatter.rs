use chrono::{DateTime, NaiveTime, TimeZone, Timelike};

/// Returns a 12-hour clock string like "12:30:00 PM".
pub fn format_clock_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    let hour = at.hour();
    let am_pm = if hour < 12 { "AM" } else { "PM" };
    let hour_12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}:{:02} {}", hour_12, at.minute(), at.second(), am_pm)
}

/// Round to `decimals` places with ties going away from zero.
/// `{:.N}` alone would round 2.5 down to "2".
fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Returns "Fiber: 5.0g".
pub fn format_grams(label: &str, grams: f64) -> String {
    format!("{}: {:.1}g", label, round_half_up(grams, 1))
}

/// Returns "Sodium: 120mg".
pub fn format_milligrams(label: &str, milligrams: f64) -> String {
    format!("{}: {:.0}mg", label, round_half_up(milligrams, 0))
}

/// Returns "450 kcal", or "— kcal" before the first successful cycle.
pub fn format_calories(calories: Option<f64>) -> String {
    match calories {
        Some(c) => format!("{} kcal", c.round() as i64),
        None => "— kcal".to_string(),
    }
}

/// Returns "30.0g" (or "—g" when unknown).
pub fn format_macro(grams: Option<f64>) -> String {
    match grams {
        Some(g) => format!("{:.1}g", round_half_up(g, 1)),
        None => "—g".to_string(),
    }
}

/// Returns "1.25 L" (or "— L" when unknown).
pub fn format_liters(liters: Option<f64>) -> String {
    match liters {
        Some(l) => format!("{:.2} L", round_half_up(l, 2)),
        None => "— L".to_string(),
    }
}

/// Returns "[▁▂▄█▆▃▂]" sparkline scaled between the series min and max.
pub fn format_sparkline(points: &[f64]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let body: String = points
        .iter()
        .map(|p| {
            if span <= f64::EPSILON {
                BLOCKS[BLOCKS.len() / 2]
            } else {
                let idx = (((p - min) / span) * (BLOCKS.len() - 1) as f64).round() as usize;
                BLOCKS[idx.min(BLOCKS.len() - 1)]
            }
        })
        .collect();
    format!("[{}]", body)
}

/// Normalizes user input like "10:30pm" to "10:30 PM".
pub fn normalize_clock(input: &str) -> Option<String> {
    let compact: String = input.split_whitespace().collect::<String>().to_uppercase();
    if !compact.is_ascii() || compact.len() < 3 {
        return None;
    }
    let (time, suffix) = compact.split_at(compact.len() - 2);
    let parsed = NaiveTime::parse_from_str(&format!("{} {}", time, suffix), "%I:%M %p").ok()?;
    let hour_12 = match parsed.hour() % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{}:{:02} {}", hour_12, parsed.minute(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn format_clock_time_afternoon() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_clock_time(&at), "12:30:05 PM");
    }

    #[test]
    fn format_clock_time_midnight_and_morning() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 5, 0).unwrap();
        assert_eq!(format_clock_time(&at), "12:05:00 AM");
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(format_clock_time(&at), "9:00:00 AM");
    }

    #[test]
    fn format_clock_time_uses_given_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let at = Utc
            .with_ymd_and_hms(2025, 3, 1, 18, 0, 0)
            .unwrap()
            .with_timezone(&tz);
        assert_eq!(format_clock_time(&at), "1:00:00 PM");
    }

    #[test]
    fn format_nutrient_strings() {
        assert_eq!(format_grams("Fiber", 5.0), "Fiber: 5.0g");
        assert_eq!(format_grams("Sugar", 12.345), "Sugar: 12.3g");
        assert_eq!(format_milligrams("Sodium", 120.4), "Sodium: 120mg");
    }

    #[test]
    fn ties_round_up() {
        assert_eq!(format_milligrams("Sodium", 2.5), "Sodium: 3mg");
        assert_eq!(format_milligrams("Sodium", 0.5), "Sodium: 1mg");
        assert_eq!(format_grams("Sugar", 0.25), "Sugar: 0.3g");
        assert_eq!(format_macro(Some(2.25)), "2.3g");
        assert_eq!(format_liters(Some(0.125)), "0.13 L");
    }

    #[test]
    fn format_totals_with_and_without_data() {
        assert_eq!(format_calories(Some(449.6)), "450 kcal");
        assert_eq!(format_calories(None), "— kcal");
        assert_eq!(format_macro(Some(30.0)), "30.0g");
        assert_eq!(format_macro(None), "—g");
        assert_eq!(format_liters(Some(0.5)), "0.50 L");
    }

    #[test]
    fn normalize_clock_accepts_loose_input() {
        assert_eq!(normalize_clock("10:30pm").as_deref(), Some("10:30 PM"));
        assert_eq!(normalize_clock(" 6:05 am ").as_deref(), Some("6:05 AM"));
        assert_eq!(normalize_clock("12:00 AM").as_deref(), Some("12:00 AM"));
        assert_eq!(normalize_clock("25:00 PM"), None);
        assert_eq!(normalize_clock("soon"), None);
    }

    #[test]
    fn format_sparkline_flat_and_ramp() {
        assert_eq!(format_sparkline(&[1.0, 1.0, 1.0]), "[▅▅▅]");
        assert_eq!(format_sparkline(&[0.0, 7.0]), "[▁█]");
    }
}
