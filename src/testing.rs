// In-memory stand-ins for the remote table and the proxy

use crate::client::ProxyApi;
use crate::error::{FetchError, UpstreamError};
use crate::record::{Fields, fields_to_json};
use crate::remote::TableBackend;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A table held in memory, answering like the remote API
#[derive(Default)]
pub struct MemoryTable {
    records: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryTable {
    pub fn with_records(records: Vec<Value>) -> Self {
        let table = Self::default();
        *table.records.lock().unwrap() = records;
        table
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), UpstreamError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(UpstreamError::Status {
                status: 503,
                details: json!({"error": {"type": "SERVICE_UNAVAILABLE"}}),
            })
        } else {
            Ok(())
        }
    }

    fn not_found() -> UpstreamError {
        UpstreamError::Status {
            status: 404,
            details: json!({"error": "NOT_FOUND"}),
        }
    }
}

#[async_trait]
impl TableBackend for MemoryTable {
    async fn list(&self) -> Result<Value, UpstreamError> {
        self.check()?;
        Ok(Value::Array(self.snapshot()))
    }

    async fn create(&self, fields: Value) -> Result<Value, UpstreamError> {
        self.check()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = json!({
            "id": format!("rec{n}"),
            "createdTime": "2024-01-01T00:00:00.000Z",
            "fields": fields,
        });
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, fields: Value) -> Result<Value, UpstreamError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r["id"] == id)
            .ok_or_else(Self::not_found)?;
        if let (Some(existing), Value::Object(patch)) = (record["fields"].as_object_mut(), fields) {
            existing.extend(patch);
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<Value, UpstreamError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r["id"] != id);
        if records.len() == before {
            return Err(Self::not_found());
        }
        Ok(json!({"id": id, "deleted": true}))
    }
}

/// A proxy double that records every call it receives
#[derive(Default)]
pub struct FakeProxy {
    pub table: MemoryTable,
    calls: Mutex<Vec<String>>,
    list_override: Mutex<Option<Result<Value, FetchError>>>,
    reject_writes: Mutex<Option<FetchError>>,
    list_delay: Mutex<Option<Duration>>,
}

impl FakeProxy {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            table: MemoryTable::with_records(records),
            ..Default::default()
        }
    }

    /// Answer every list call with this outcome instead of the table
    pub fn override_list(&self, outcome: Result<Value, FetchError>) {
        *self.list_override.lock().unwrap() = Some(outcome);
    }

    /// Make every list call take this long
    pub fn delay_list(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    /// Fail every create, update and delete with this error
    pub fn reject_writes(&self, err: FetchError) {
        *self.reject_writes.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(call);
        match self.reject_writes.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn upstream(e: UpstreamError) -> FetchError {
    FetchError::Status {
        status: 500,
        body: json!({"error": "API error", "details": e.details()}),
    }
}

#[async_trait]
impl ProxyApi for FakeProxy {
    async fn list(&self) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push("list".to_string());
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(outcome) = self.list_override.lock().unwrap().clone() {
            return outcome;
        }
        self.table.list().await.map_err(upstream)
    }

    async fn create(&self, fields: &Fields) -> Result<Value, FetchError> {
        self.record("create".to_string())?;
        self.table
            .create(Value::Object(fields_to_json(fields)))
            .await
            .map_err(upstream)
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<Value, FetchError> {
        self.record(format!("update {id}"))?;
        self.table
            .update(id, Value::Object(fields_to_json(fields)))
            .await
            .map_err(upstream)
    }

    async fn delete(&self, id: &str) -> Result<Value, FetchError> {
        self.record(format!("delete {id}"))?;
        self.table.delete(id).await.map_err(upstream)
    }
}

/// Build a remote-shaped record
pub fn remote(id: &str, fields: Value) -> Value {
    let fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    json!({"id": id, "fields": fields})
}
