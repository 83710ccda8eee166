use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::window::AggregationWindow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    /// Grams
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugar: f64,
    /// Milligrams
    pub sodium: f64,
    /// Liters
    pub water: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    pub name: String,
    /// Local clock time the meal was logged, e.g. "12:30:00 PM"
    pub time: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// Auxiliary nutrients present on the record, e.g. "Fiber: 5.0g"
    pub nutrients: Vec<String>,
}

/// Display-ready result of one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionSnapshot {
    pub totals: NutritionTotals,
    pub meals: Vec<MealSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<AggregationWindow>,
    /// None until the first successful cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl NutritionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fetched_at.is_none()
    }
}
