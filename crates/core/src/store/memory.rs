//! In-memory record store.
//!
//! Holds one map of records per store and keeps a log of every call made against it, so tests
//! can assert on exactly which reads and writes a service performed. Faults can be injected per
//! store to simulate an unreachable API, a rejected write or an unreadable export.

use super::{parse_export, RecordStore, Store, StoreError, StoreResult, UpsertResponse};
use crate::constants::FIELD_RECORD_ID;
use crate::records::Record;
use consent_types::RecordId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call made against an [`InMemoryRecordStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    Fetch { store: Store, record_id: String },
    Upsert { store: Store, record: Record },
}

/// Fault injected into one store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Every call fails at the transport level.
    Unreachable,
    /// Reads and writes are answered with this status and body.
    Reject { status: u16, body: String },
    /// Writes are answered with this status and body; reads are unaffected.
    RejectWrites { status: u16, body: String },
    /// Reads return this payload instead of the stored record; writes are unaffected.
    Garbled(String),
}

#[derive(Default)]
struct Inner {
    records: HashMap<Store, HashMap<String, Record>>,
    faults: HashMap<Store, Fault>,
    calls: Vec<StoreCall>,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<Inner>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed `store` with `record`, keyed by its `record_id` field.
    ///
    /// Records without a textual `record_id` are ignored.
    pub fn insert(&self, store: Store, record: Record) {
        let Some(id) = record_key(&record) else {
            tracing::warn!("ignoring seeded {} record without record_id", store);
            return;
        };
        self.lock()
            .records
            .entry(store)
            .or_default()
            .insert(id, record);
    }

    /// Current contents of one record.
    pub fn get(&self, store: Store, record_id: &str) -> Option<Record> {
        self.lock()
            .records
            .get(&store)
            .and_then(|records| records.get(record_id))
            .cloned()
    }

    pub fn set_fault(&self, store: Store, fault: Fault) {
        self.lock().faults.insert(store, fault);
    }

    pub fn clear_fault(&self, store: Store) {
        self.lock().faults.remove(&store);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Calls made against one store.
    pub fn calls_to(&self, store: Store) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                StoreCall::Fetch { store: s, .. } | StoreCall::Upsert { store: s, .. } => {
                    *s == store
                }
            })
            .collect()
    }

    /// Records sent to `store` through `upsert`, in order.
    pub fn upserts_to(&self, store: Store) -> Vec<Record> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Upsert { store: s, record } if s == store => Some(record),
                _ => None,
            })
            .collect()
    }
}

fn record_key(record: &Record) -> Option<String> {
    match record.get(FIELD_RECORD_ID) {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        _ => None,
    }
}

fn unreachable_error(store: Store) -> StoreError {
    StoreError::Transport {
        store,
        source: Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "in-memory store marked unreachable",
        )),
    }
}

/// Blank values never overwrite stored data, matching the API's "normal" overwrite behaviour.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_one(&self, store: Store, record_id: &RecordId) -> StoreResult<Option<Record>> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Fetch {
            store,
            record_id: record_id.as_str().to_string(),
        });

        match inner.faults.get(&store).cloned() {
            Some(Fault::Unreachable) => Err(unreachable_error(store)),
            Some(Fault::Reject { status, body }) => Err(StoreError::Status {
                store,
                status,
                body,
            }),
            Some(Fault::Garbled(payload)) => parse_export(store, &payload),
            Some(Fault::RejectWrites { .. }) | None => Ok(inner
                .records
                .get(&store)
                .and_then(|records| records.get(record_id.as_str()))
                .cloned()),
        }
    }

    async fn upsert(&self, store: Store, record: Record) -> StoreResult<UpsertResponse> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Upsert {
            store,
            record: record.clone(),
        });

        match inner.faults.get(&store).cloned() {
            Some(Fault::Unreachable) => return Err(unreachable_error(store)),
            Some(Fault::Reject { status, body } | Fault::RejectWrites { status, body }) => {
                return Ok(UpsertResponse { status, body })
            }
            Some(Fault::Garbled(_)) | None => {}
        }

        let Some(id) = record_key(&record) else {
            return Ok(UpsertResponse {
                status: 400,
                body: r#"{"error":"record_id is missing"}"#.to_string(),
            });
        };

        let stored = inner
            .records
            .entry(store)
            .or_default()
            .entry(id)
            .or_default();
        for (field, value) in record {
            if is_blank(&value) && stored.contains_key(&field) {
                continue;
            }
            stored.insert(field, value);
        }

        Ok(UpsertResponse {
            status: 200,
            body: r#"{"count": 1}"#.to_string(),
        })
    }
}
