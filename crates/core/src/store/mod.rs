//! Record store access.
//!
//! The transfer and dispatch services only need two operations from a record store: read one
//! record by id, and upsert one record. [`RecordStore`] captures that seam; implementations:
//!
//! - [`redcap::RedcapClient`]: the HTTP record API used in production
//! - [`memory::InMemoryRecordStore`]: a local store that records every call, for tests and demos

pub mod memory;
pub mod redcap;

use crate::records::Record;
use consent_types::RecordId;

/// Selects which of the two record stores an operation targets.
///
/// The store client maps each variant to its own credential, so callers never handle tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Store {
    Source,
    Target,
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Status and body returned by an upsert call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertResponse {
    pub status: u16,
    pub body: String,
}

impl UpsertResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not reach the {store} store: {source}")]
    Transport {
        store: Store,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("the {store} store responded with status {status}: {body}")]
    Status {
        store: Store,
        status: u16,
        body: String,
    },
    #[error("the {store} store returned an unreadable payload: {source}")]
    Decode {
        store: Store,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record for the {store} store: {source}")]
    Encode {
        store: Store,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-one / upsert-one access to the two record stores.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record with `record_id`, or `None` if the store has no such record.
    async fn fetch_one(&self, store: Store, record_id: &RecordId) -> StoreResult<Option<Record>>;

    /// Upsert `record`, touching only the fields it carries.
    ///
    /// A non-2xx answer is returned as an `UpsertResponse`, not an error; only transport and
    /// encoding problems are errors.
    async fn upsert(&self, store: Store, record: Record) -> StoreResult<UpsertResponse>;
}

/// Parse a record export payload (a JSON array of flat records).
///
/// An empty array means "no such record". When several rows come back the first one is used.
pub fn parse_export(store: Store, payload: &str) -> StoreResult<Option<Record>> {
    let rows: Vec<Record> =
        serde_json::from_str(payload).map_err(|source| StoreError::Decode { store, source })?;
    Ok(rows.into_iter().next())
}
