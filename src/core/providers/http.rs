use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
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

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Talks to a companion app that exposes the phone's health platform over HTTPS.
pub struct BridgeProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Value>,
}

/// Validate that a bridge endpoint URL uses HTTPS.
///
/// The bearer token is sent on every request, so plain HTTP and other
/// schemes are refused up front.
pub fn validate_endpoint(url: &str) -> anyhow::Result<()> {
    if !url.starts_with("https://") {
        anyhow::bail!("Health bridge: endpoint must use HTTPS, got: {}", url);
    }
    Ok(())
}

fn parse_status(raw: StatusResponse) -> Availability {
    match raw.status.to_lowercase().as_str() {
        "available" | "sdk_available" => Availability::Available,
        _ => Availability::Unavailable {
            reason: raw.reason.or(Some(raw.status)),
        },
    }
}

impl BridgeProvider {
    pub fn new(endpoint: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        validate_endpoint(endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        check_status(status, &bytes)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Map a non-success response to an error. 401 and 403 mean the bridge
/// refused our credentials.
fn check_status(status: StatusCode, body: &[u8]) -> Result<(), ProviderError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::Unauthorized(format!(
            "bridge rejected credentials (HTTP {})",
            status.as_u16()
        )));
    }
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).trim().to_string(),
        });
    }
    Ok(())
}

/// `startTime` / `endTime` query pairs for a read over `window`.
fn window_query(window: &AggregationWindow) -> [(&'static str, String); 2] {
    [
        (
            "startTime",
            window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        (
            "endTime",
            window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ]
}

#[async_trait]
impl HealthProvider for BridgeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Http
    }

    async fn availability(&self) -> Result<Availability, ProviderError> {
        let raw: StatusResponse = self.get_json("/status", &[]).await?;
        Ok(parse_status(raw))
    }

    async fn granted_permissions(&self) -> Result<Vec<Permission>, ProviderError> {
        let entries: Vec<Value> = self.get_json("/permissions", &[]).await?;
        Ok(known_permissions(entries))
    }

    async fn read_records(
        &self,
        record_type: RecordType,
        window: &AggregationWindow,
    ) -> Result<Vec<RawRecord>, ProviderError> {
        ensure_readable(record_type)?;
        let data: RecordsResponse = self
            .get_json(&format!("/records/{}", record_type.id()), &window_query(window))
            .await?;
        let records = records_of_type(data.records, record_type)?;
        debug!(%record_type, count = records.len(), "read bridge records");
        Ok(records)
    }
}
