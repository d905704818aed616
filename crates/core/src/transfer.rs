//! Source-to-target record transfer.
//!
//! A transfer reads one record from the source store, projects it through the field allow-list
//! and upserts the projection into the target store. The consent state of the record is
//! returned so the caller can offer the matching follow-up action.
//!
//! ## Write-back failures
//!
//! Once the source record has been read, the transfer is committed from the caller's point of
//! view. A non-2xx answer to the target upsert does not fail the transfer; it is reported as
//! [`TransferOutcome::CommittedWithUpstreamWarning`] so callers can detect it. A transport
//! failure on the upsert is still an error.

use crate::consent::ConsentState;
use crate::records::{SourceRecord, TargetRecord};
use crate::store::{RecordStore, Store, StoreError};
use crate::{BridgeError, BridgeResult};
use consent_types::RecordId;
use serde::Serialize;
use std::sync::Arc;

/// What a transfer hands to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub record_id: RecordId,
    pub consent_state: ConsentState,
    /// The raw consent code as copied to the target store.
    pub consent_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The target store accepted the upsert.
    Committed { result: TransferResult, status: u16 },
    /// The target store answered the upsert with a non-2xx status.
    CommittedWithUpstreamWarning {
        result: TransferResult,
        status: u16,
        body: String,
    },
}

impl TransferOutcome {
    pub fn result(&self) -> &TransferResult {
        match self {
            Self::Committed { result, .. } | Self::CommittedWithUpstreamWarning { result, .. } => {
                result
            }
        }
    }

    /// Status code returned by the target upsert.
    pub fn upstream_status(&self) -> u16 {
        match self {
            Self::Committed { status, .. } | Self::CommittedWithUpstreamWarning { status, .. } => {
                *status
            }
        }
    }

    pub fn has_upstream_warning(&self) -> bool {
        matches!(self, Self::CommittedWithUpstreamWarning { .. })
    }
}

/// Transfers participant records from the source store to the target store.
#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn RecordStore>,
}

impl TransferService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Transfer the record identified by `record_id`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidRequest` if `record_id` is empty or whitespace (no remote calls are made),
    /// - `NotFound` if the source store has no such record (the target is not touched),
    /// - `UpstreamUnavailable` if either store cannot be reached or the source export is
    ///   rejected or unreadable.
    pub async fn transfer(&self, record_id: &str) -> BridgeResult<TransferOutcome> {
        let record_id = RecordId::parse(record_id)
            .map_err(|_| BridgeError::InvalidRequest("no record ID provided".into()))?;

        let raw = self
            .store
            .fetch_one(Store::Source, &record_id)
            .await
            .map_err(BridgeError::UpstreamUnavailable)?
            .ok_or_else(|| BridgeError::NotFound(record_id.clone()))?;

        let source = SourceRecord::from_record(raw).map_err(|source| {
            BridgeError::UpstreamUnavailable(StoreError::Decode {
                store: Store::Source,
                source,
            })
        })?;

        let target = TargetRecord::project(record_id.clone(), &source);
        let payload = target.to_record().map_err(BridgeError::Serialization)?;

        let response = self
            .store
            .upsert(Store::Target, payload)
            .await
            .map_err(BridgeError::UpstreamUnavailable)?;

        tracing::info!(
            record_id = %record_id,
            status = response.status,
            "sync event"
        );

        let result = TransferResult {
            record_id,
            consent_state: target.consent_state(),
            consent_code: target.consent_choice,
        };

        if response.is_success() {
            Ok(TransferOutcome::Committed {
                result,
                status: response.status,
            })
        } else {
            tracing::warn!(
                record_id = %result.record_id,
                status = response.status,
                body = %response.body,
                "target store rejected transferred record"
            );
            Ok(TransferOutcome::CommittedWithUpstreamWarning {
                result,
                status: response.status,
                body: response.body,
            })
        }
    }
}
