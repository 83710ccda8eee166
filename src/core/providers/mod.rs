pub mod file;
pub mod http;

#[cfg(test)]
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::core::config::ProviderSettings;
use crate::core::models::nutrition::RawRecord;
use crate::core::models::permission::{Availability, Permission, RecordType};
use crate::core::window::AggregationWindow;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to decode provider data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to read provider data: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// A health-data platform that holds the user's nutrition and hydration records.
///
/// Implementations must be cheap to call repeatedly: the poller queries
/// availability and permissions on every authorization check and reads
/// records on every cycle.
#[async_trait]
pub trait HealthProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// One-time platform setup. Safe to call more than once.
    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn availability(&self) -> Result<Availability, ProviderError>;

    async fn granted_permissions(&self) -> Result<Vec<Permission>, ProviderError>;

    /// Records of `record_type` whose start time falls in `window`, in provider order.
    async fn read_records(
        &self,
        record_type: RecordType,
        window: &AggregationWindow,
    ) -> Result<Vec<RawRecord>, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    File,
    Http,
}

impl ProviderKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "file" | "export" => Some(Self::File),
            "http" | "https" | "bridge" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Http => "http",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::File => "Health export file",
            Self::Http => "Health bridge",
        }
    }

    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::File, ProviderKind::Http]
    }
}

/// Only nutrition and hydration records have a typed representation.
pub fn ensure_readable(record_type: RecordType) -> Result<(), ProviderError> {
    match record_type {
        RecordType::Nutrition | RecordType::Hydration => Ok(()),
        other => Err(ProviderError::Other(format!(
            "{} records cannot be read by this app",
            other
        ))),
    }
}

/// Granted entries this app can represent. Providers also report record
/// types it has no use for (`Steps`, `HeartRate`, ...); those are skipped.
pub fn known_permissions(entries: Vec<Value>) -> Vec<Permission> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Permission>(entry) {
            Ok(permission) => Some(permission),
            Err(e) => {
                debug!(error = %e, "skipping granted permission");
                None
            }
        })
        .collect()
}

/// Decode the entries tagged with `record_type`, keeping their order.
/// Entries of any other type are left undecoded.
pub fn records_of_type(
    entries: Vec<Value>,
    record_type: RecordType,
) -> Result<Vec<RawRecord>, ProviderError> {
    entries
        .into_iter()
        .filter(|entry| entry.get("recordType").and_then(Value::as_str) == Some(record_type.id()))
        .map(|entry| serde_json::from_value(entry).map_err(ProviderError::from))
        .collect()
}

/// Build the provider described by the `[provider]` config section.
pub fn from_settings(settings: &ProviderSettings) -> anyhow::Result<Arc<dyn HealthProvider>> {
    let kind = ProviderKind::from_id(&settings.kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown provider kind: '{}'", settings.kind))?;
    let provider: Arc<dyn HealthProvider> = match kind {
        ProviderKind::File => Arc::new(file::ExportFileProvider::new(settings.export_path())),
        ProviderKind::Http => {
            let endpoint = settings
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("provider.endpoint is required for kind 'http'"))?;
            Arc::new(http::BridgeProvider::new(endpoint, settings.api_key.clone())?)
        }
    };
    Ok(provider)
}
