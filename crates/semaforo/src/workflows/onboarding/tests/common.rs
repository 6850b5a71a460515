use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::onboarding::access::{
    AccessScope, OperatorContext, OperatorCredential, OperatorDirectory,
};
use crate::workflows::onboarding::archive::{ArchiveBatch, ArchivePolicy, ExportError, ExportSink};
use crate::workflows::onboarding::calendar::HolidayCalendar;
use crate::workflows::onboarding::domain::{CustomerRecord, NewCustomer};
use crate::workflows::onboarding::store::{RecordStore, StoreError};
use crate::workflows::onboarding::{onboarding_router, OnboardingApi, OnboardingService};

pub(super) const NORTH: &str = "CALL-NORTH";
pub(super) const SOUTH: &str = "CALL-SOUTH";

/// 2025-10-06, a Monday.
pub(super) fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 6).expect("valid date")
}

pub(super) fn day(offset: i64) -> NaiveDate {
    monday() + chrono::Duration::days(offset)
}

pub(super) fn at(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(9, 30, 0).expect("valid time")
}

pub(super) fn north_operator() -> OperatorContext {
    OperatorContext::new("north", AccessScope::CallCenter(NORTH.to_string()))
}

pub(super) fn south_operator() -> OperatorContext {
    OperatorContext::new("south", AccessScope::CallCenter(SOUTH.to_string()))
}

pub(super) fn directory() -> OperatorDirectory {
    OperatorDirectory::new(vec![
        OperatorCredential::new("north", "n0rth", AccessScope::CallCenter(NORTH.to_string())),
        OperatorCredential::new("south", "s0uth", AccessScope::CallCenter(SOUTH.to_string())),
        OperatorCredential::new("admin", "r00t", AccessScope::AllAccess),
    ])
}

pub(super) fn new_customer(name: &str) -> NewCustomer {
    NewCustomer {
        call_center_id: None,
        sales_agent: "Ana".to_string(),
        customer_name: name.to_string(),
    }
}

pub(super) fn build_service(
    policy: ArchivePolicy,
) -> (
    OnboardingService<MemoryStore, MemorySink>,
    Arc<MemoryStore>,
    Arc<MemorySink>,
) {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(MemorySink::default());
    let service = OnboardingService::new(
        store.clone(),
        sink.clone(),
        HolidayCalendar::default(),
        policy,
    );
    (service, store, sink)
}

pub(super) fn router_for(
    service: OnboardingService<MemoryStore, MemorySink>,
    now: NaiveDateTime,
) -> axum::Router {
    let api = OnboardingApi::new(Arc::new(service), Arc::new(directory())).with_clock(move || now);
    onboarding_router(api)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    rows: Arc<Mutex<Vec<CustomerRecord>>>,
}

impl MemoryStore {
    pub(super) fn rows(&self) -> Vec<CustomerRecord> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn seed(&self, rows: Vec<CustomerRecord>) {
        *self.rows.lock().expect("store mutex poisoned") = rows;
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Ok(self.rows())
    }

    fn save_all(&self, records: &[CustomerRecord]) -> Result<(), StoreError> {
        *self.rows.lock().expect("store mutex poisoned") = records.to_vec();
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn save_all(&self, _records: &[CustomerRecord]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

/// Serves a fixed table but refuses every write.
pub(super) struct ReadOnlyStore {
    rows: Vec<CustomerRecord>,
}

impl ReadOnlyStore {
    pub(super) fn new(rows: Vec<CustomerRecord>) -> Self {
        Self { rows }
    }
}

impl RecordStore for ReadOnlyStore {
    fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Ok(self.rows.clone())
    }

    fn save_all(&self, _records: &[CustomerRecord]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    batches: Arc<Mutex<Vec<ArchiveBatch>>>,
}

impl MemorySink {
    pub(super) fn batches(&self) -> Vec<ArchiveBatch> {
        self.batches.lock().expect("sink mutex poisoned").clone()
    }
}

impl ExportSink for MemorySink {
    fn archive(&self, batch: &ArchiveBatch) -> Result<String, ExportError> {
        self.batches
            .lock()
            .expect("sink mutex poisoned")
            .push(batch.clone());
        Ok(format!("memory://{}", batch.label()))
    }
}

pub(super) struct RejectingSink;

impl ExportSink for RejectingSink {
    fn archive(&self, batch: &ArchiveBatch) -> Result<String, ExportError> {
        Err(ExportError::Rejected(format!("{} refused", batch.label())))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
