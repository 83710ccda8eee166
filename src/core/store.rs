use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::config::data_dir;
use crate::core::models::body::{SleepEntry, WeeklyForm, WeightEntry, WeightUnit};
use crate::core::weekly::record_weight;

const WEIGHT_HISTORY: &str = "weight_history.json";
const WEEKLY_FORM: &str = "weekly_form.json";
const SLEEP_HISTORY: &str = "sleep_history.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt data in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON documents kept under one directory. Missing files read as empty.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Store rooted at the data dir, respecting XDG_DATA_HOME.
    pub fn open_default() -> Self {
        Self::at(data_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn weight_history(&self) -> Result<Vec<WeightEntry>, StoreError> {
        self.read(WEIGHT_HISTORY)
    }

    pub fn weekly_form(&self) -> Result<WeeklyForm, StoreError> {
        self.read(WEEKLY_FORM)
    }

    pub fn sleep_history(&self) -> Result<Vec<SleepEntry>, StoreError> {
        self.read(SLEEP_HISTORY)
    }

    /// Prepend a weight reading to the history and merge it into the weekly form.
    /// Returns the new entry and the week key it was filed under.
    pub fn add_weight(
        &self,
        weight: f64,
        unit: WeightUnit,
        now: DateTime<Utc>,
    ) -> Result<(WeightEntry, String), StoreError> {
        let entry = WeightEntry {
            id: now.timestamp_millis().to_string(),
            weight,
            unit,
            date: now.to_rfc3339(),
        };

        let mut form = self.weekly_form()?;
        let week = record_weight(&mut form, weight, unit, &now);
        self.write(WEEKLY_FORM, &form)?;

        let mut history = self.weight_history()?;
        history.insert(0, entry.clone());
        self.write(WEIGHT_HISTORY, &history)?;

        debug!(weight, unit = unit.id(), %week, "recorded weight");
        Ok((entry, week))
    }

    /// Prepend a night of sleep, dated by the UTC day of `now`.
    pub fn add_sleep(
        &self,
        sleep_time: &str,
        wake_time: &str,
        now: DateTime<Utc>,
    ) -> Result<SleepEntry, StoreError> {
        let entry = SleepEntry {
            date: now.format("%Y-%m-%d").to_string(),
            sleep_time: sleep_time.to_string(),
            wake_time: wake_time.to_string(),
        };
        let mut history = self.sleep_history()?;
        history.insert(0, entry.clone());
        self.write(SLEEP_HISTORY, &history)?;
        debug!(date = %entry.date, "recorded sleep");
        Ok(entry)
    }

    fn read<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.root.join(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt { path, source })
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let path = self.root.join(name);
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }
}
