//! Consent alert dispatch.
//!
//! Reads a transferred record back from the target store, classifies its consent code and sets
//! the matching trigger field, which fires the store's own notification alert.
//!
//! ```text
//! Fetched ─┬─ Electronic ─┬─ Dispatched
//!          ├─ InPerson ───┴─ DispatchFailed
//!          └─ Unset ──────── NoActionTaken
//! ```
//!
//! There is no re-entrancy guard. Dispatching the same record twice performs two writes, and two
//! concurrent dispatches for one record may both read the same consent code and both write.

use crate::consent::{ConsentBranch, ConsentState};
use crate::records::{consent_code, NotificationUpdate};
use crate::store::{RecordStore, Store, StoreError};
use crate::{BridgeError, BridgeResult};
use consent_types::RecordId;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The trigger for `branch` was written.
    Dispatched(ConsentBranch),
    /// The record carries no actionable consent code; nothing was written.
    NoActionTaken { consent_code: String },
    /// The target store rejected the trigger update.
    DispatchFailed { status: u16, body: String },
}

/// Fires the consent alert matching a transferred record's consent code.
#[derive(Clone)]
pub struct ConsentDispatcher {
    store: Arc<dyn RecordStore>,
}

impl ConsentDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Dispatch the consent alert for `record_id`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidRequest` if `record_id` is empty or whitespace,
    /// - `RecordUnavailable` if the target store has no such record or its export is rejected
    ///   or unreadable,
    /// - `UpstreamUnavailable` if the target store cannot be reached.
    pub async fn dispatch(&self, record_id: &str) -> BridgeResult<DispatchOutcome> {
        let record_id = RecordId::parse(record_id)
            .map_err(|_| BridgeError::InvalidRequest("no record ID provided".into()))?;

        let record = match self.store.fetch_one(Store::Target, &record_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Err(BridgeError::RecordUnavailable {
                    record_id,
                    reason: "no record returned".into(),
                })
            }
            Err(e @ StoreError::Transport { .. }) => {
                return Err(BridgeError::UpstreamUnavailable(e));
            }
            Err(e) => {
                return Err(BridgeError::RecordUnavailable {
                    record_id,
                    reason: e.to_string(),
                })
            }
        };

        let code = consent_code(&record);
        let Some(branch) = ConsentState::from_code(&code).branch() else {
            tracing::info!(
                record_id = %record_id,
                choice = %code,
                "no consent alert sent"
            );
            return Ok(DispatchOutcome::NoActionTaken { consent_code: code });
        };

        let update = NotificationUpdate::new(record_id, branch);
        let response = self
            .store
            .upsert(Store::Target, update.to_record())
            .await
            .map_err(BridgeError::UpstreamUnavailable)?;

        if response.is_success() {
            tracing::info!(
                record_id = %update.record_id(),
                branch = %update.branch(),
                status = response.status,
                "consent alert triggered"
            );
            Ok(DispatchOutcome::Dispatched(update.branch()))
        } else {
            tracing::warn!(
                record_id = %update.record_id(),
                branch = %update.branch(),
                status = response.status,
                body = %response.body,
                "target store rejected consent alert trigger"
            );
            Ok(DispatchOutcome::DispatchFailed {
                status: response.status,
                body: response.body,
            })
        }
    }
}
