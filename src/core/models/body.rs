use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "kg" | "kgs" => Some(Self::Kg),
            "lb" | "lbs" => Some(Self::Lbs),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Lbs => "lbs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub weight: f64,
    pub unit: WeightUnit,
    /// RFC 3339 timestamp
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
    /// YYYY-MM-DD
    pub date: String,
    pub sleep_time: String,
    pub wake_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<WeightUnit>,
    /// Fields written by other forms for the same day are kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Per-user weekly form: `week<N>` buckets keyed by day name.
///
/// Top-level keys that are not week buckets belong to other forms and are
/// carried through `other` untouched, whatever their JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeeklyForm", into = "RawWeeklyForm")]
pub struct WeeklyForm {
    pub first_entry_date: Option<String>,
    pub weeks: BTreeMap<String, BTreeMap<String, DayEntry>>,
    pub other: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWeeklyForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_entry_date: Option<String>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

fn is_week_key(key: &str) -> bool {
    key.strip_prefix("week")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

impl TryFrom<RawWeeklyForm> for WeeklyForm {
    type Error = serde_json::Error;

    fn try_from(raw: RawWeeklyForm) -> Result<Self, Self::Error> {
        let mut form = WeeklyForm {
            first_entry_date: raw.first_entry_date,
            ..Default::default()
        };
        for (key, value) in raw.fields {
            if is_week_key(&key) {
                form.weeks.insert(key, serde_json::from_value(value)?);
            } else {
                form.other.insert(key, value);
            }
        }
        Ok(form)
    }
}

impl From<WeeklyForm> for RawWeeklyForm {
    fn from(form: WeeklyForm) -> Self {
        let mut fields = form.other;
        for (key, days) in form.weeks {
            let value = serde_json::to_value(days).unwrap_or(Value::Null);
            fields.insert(key, value);
        }
        RawWeeklyForm {
            first_entry_date: form.first_entry_date,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_foreign_fields_survive() {
        let json = r#"{
            "firstEntryDate": "2025-03-01",
            "updatedAt": "2025-03-01T10:00:00Z",
            "version": 3,
            "week1": { "Saturday": { "weight": 76.0, "weightUnit": "kg", "mood": "ok" } }
        }"#;
        let form: WeeklyForm = serde_json::from_str(json).unwrap();
        assert_eq!(form.weeks["week1"]["Saturday"].weight, Some(76.0));
        assert_eq!(form.other["updatedAt"], "2025-03-01T10:00:00Z");
        assert_eq!(form.other["version"], 3);

        let back: Value = serde_json::to_value(&form).unwrap();
        assert_eq!(back["version"], 3);
        assert_eq!(back["week1"]["Saturday"]["mood"], "ok");
        assert_eq!(back["firstEntryDate"], "2025-03-01");
    }

    #[test]
    fn malformed_week_bucket_is_rejected() {
        let json = r#"{ "week2": "not a week" }"#;
        assert!(serde_json::from_str::<WeeklyForm>(json).is_err());
    }

    #[test]
    fn week_key_shape() {
        assert!(is_week_key("week12"));
        assert!(!is_week_key("week"));
        assert!(!is_week_key("weekly"));
        assert!(!is_week_key("notes"));
    }
}
