use crate::store::StoreError;
use consent_types::RecordId;

/// Failures surfaced by the transfer and dispatch services.
///
/// Every remote failure is converted into one of these kinds at the component boundary; the
/// HTTP and CLI layers map them onto user-facing responses.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The caller omitted required input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The identifier does not exist in the source store.
    #[error("record {0} not found in the source store")]
    NotFound(RecordId),
    /// The identifier could not be read back from the target store after a prior transfer.
    #[error("record {record_id} could not be retrieved from the target store: {reason}")]
    RecordUnavailable { record_id: RecordId, reason: String },
    /// Transport-level failure talking to a record store.
    #[error("record store unavailable: {0}")]
    UpstreamUnavailable(#[source] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("failed to encode record: {0}")]
    Serialization(serde_json::Error),
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
