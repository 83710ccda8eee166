use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::permission::RecordType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Energy {
    pub in_kilocalories: Option<f64>,
    pub in_kilojoules: Option<f64>,
}

impl Energy {
    pub fn kilocalories(&self) -> Option<f64> {
        self.in_kilocalories
            .or_else(|| self.in_kilojoules.map(|kj| kj / 4.184))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mass {
    pub in_grams: Option<f64>,
    pub in_milligrams: Option<f64>,
}

impl Mass {
    pub fn grams(&self) -> Option<f64> {
        self.in_grams
            .or_else(|| self.in_milligrams.map(|mg| mg / 1000.0))
    }

    pub fn milligrams(&self) -> Option<f64> {
        self.in_milligrams
            .or_else(|| self.in_grams.map(|g| g * 1000.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub in_liters: Option<f64>,
    pub in_milliliters: Option<f64>,
}

impl Volume {
    pub fn liters(&self) -> Option<f64> {
        self.in_liters
            .or_else(|| self.in_milliliters.map(|ml| ml / 1000.0))
    }
}

/// One logged meal as the provider reports it. Every quantity may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub energy: Option<Energy>,
    pub protein: Option<Mass>,
    pub total_fat: Option<Mass>,
    pub total_carbohydrate: Option<Mass>,
    pub dietary_fiber: Option<Mass>,
    pub sugar: Option<Mass>,
    pub sodium: Option<Mass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationRecord {
    pub start_time: DateTime<Utc>,
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "recordType")]
pub enum RawRecord {
    Nutrition(NutritionRecord),
    Hydration(HydrationRecord),
}

impl RawRecord {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Nutrition(_) => RecordType::Nutrition,
            Self::Hydration(_) => RecordType::Hydration,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            Self::Nutrition(r) => r.start_time,
            Self::Hydration(r) => r.start_time,
        }
    }
}

/// Value of an optional quantity, treating absence as zero.
pub fn or_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Value of an optional quantity only when it is present and non-zero.
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
