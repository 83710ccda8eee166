//! In-memory provider for exercising the gate, the cycle and the poller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::models::nutrition::RawRecord;
use crate::core::models::permission::{Availability, Permission, RecordType};
use crate::core::providers::{HealthProvider, ProviderError, ProviderKind};
use crate::core::window::AggregationWindow;

#[derive(Default)]
pub struct ScriptedProvider {
    pub availability: Mutex<Option<Availability>>,
    pub granted: Mutex<Vec<Permission>>,
    pub records: Mutex<HashMap<RecordType, Vec<RawRecord>>>,
    /// Record types whose next reads fail.
    pub failing: Mutex<Vec<RecordType>>,
    pub fail_permissions: Mutex<bool>,
    pub panic_on_read: Mutex<bool>,
    pub panic_on_permissions: Mutex<bool>,
    /// Simulated latency of every read.
    pub read_delay: Mutex<Option<Duration>>,
    pub init_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn granting(permissions: Vec<Permission>) -> Self {
        let provider = Self::default();
        *provider.availability.lock().unwrap() = Some(Availability::Available);
        *provider.granted.lock().unwrap() = permissions;
        provider
    }

    pub fn unavailable() -> Self {
        let provider = Self::default();
        *provider.availability.lock().unwrap() = Some(Availability::Unavailable {
            reason: Some("not installed".into()),
        });
        provider
    }

    pub fn set_records(&self, record_type: RecordType, records: Vec<RawRecord>) {
        self.records.lock().unwrap().insert(record_type, records);
    }

    pub fn fail_reads_of(&self, record_type: RecordType) {
        self.failing.lock().unwrap().push(record_type);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn reads(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::File
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn availability(&self) -> Result<Availability, ProviderError> {
        self.availability
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::Other("availability not scripted".into()))
    }

    async fn granted_permissions(&self) -> Result<Vec<Permission>, ProviderError> {
        if *self.panic_on_permissions.lock().unwrap() {
            panic!("scripted permission panic");
        }
        if *self.fail_permissions.lock().unwrap() {
            return Err(ProviderError::Other("permission query failed".into()));
        }
        Ok(self.granted.lock().unwrap().clone())
    }

    async fn read_records(
        &self,
        record_type: RecordType,
        _window: &AggregationWindow,
    ) -> Result<Vec<RawRecord>, ProviderError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.panic_on_read.lock().unwrap() {
            panic!("scripted provider panic");
        }
        if self.failing.lock().unwrap().contains(&record_type) {
            return Err(ProviderError::Other(format!("{} read failed", record_type)));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&record_type)
            .cloned()
            .unwrap_or_default())
    }
}
