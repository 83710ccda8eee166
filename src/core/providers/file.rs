use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::models::nutrition::RawRecord;
use crate::core::models::permission::{Availability, Permission, RecordType};
use crate::core::providers::{
    ensure_readable, known_permissions, records_of_type, HealthProvider, ProviderError,
    ProviderKind,
};
use crate::core::window::AggregationWindow;

/// Reads a health-data export written by the phone-side sync app.
///
/// The file is re-read on every call so edits show up on the next cycle.
/// A missing file means the platform is not set up on this machine.
pub struct ExportFileProvider {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportFile {
    status: Option<String>,
    reason: Option<String>,
    #[serde(default)]
    granted_permissions: Vec<Value>,
    #[serde(default)]
    records: Vec<Value>,
}

impl ExportFileProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<ExportFile, ProviderError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::Unavailable(format!(
                    "export file not found: {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl HealthProvider for ExportFileProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::File
    }

    async fn availability(&self) -> Result<Availability, ProviderError> {
        match self.load().await {
            Ok(export) => Ok(match export.status.as_deref() {
                None | Some("available") => Availability::Available,
                Some(other) => Availability::Unavailable {
                    reason: export.reason.or_else(|| Some(other.to_string())),
                },
            }),
            Err(ProviderError::Unavailable(reason)) => Ok(Availability::Unavailable {
                reason: Some(reason),
            }),
            Err(e) => Err(e),
        }
    }

    async fn granted_permissions(&self) -> Result<Vec<Permission>, ProviderError> {
        Ok(known_permissions(self.load().await?.granted_permissions))
    }

    async fn read_records(
        &self,
        record_type: RecordType,
        window: &AggregationWindow,
    ) -> Result<Vec<RawRecord>, ProviderError> {
        ensure_readable(record_type)?;
        let export = self.load().await?;
        let records: Vec<RawRecord> = records_of_type(export.records, record_type)?
            .into_iter()
            .filter(|r| window.contains(&r.start_time()))
            .collect();
        debug!(
            path = %self.path.display(),
            %record_type,
            count = records.len(),
            "read export records"
        );
        Ok(records)
    }
}
