//! # Consent Core
//!
//! Core logic for moving screened participants between two REDCap projects and firing the
//! consent alert that matches their stated preference.
//!
//! - [`transfer`]: copy an allow-listed subset of a source record into the target project
//! - [`dispatch`]: read the target record back and set the matching consent trigger field
//! - [`store`]: the record store seam, with HTTP and in-memory implementations
//!
//! **No API concerns**: HTTP servers, HTML presentation and CLI parsing belong in `api-rest` and
//! `consent-cli`. Configuration is resolved by the binaries and passed in as [`CoreConfig`].

pub mod config;
pub mod consent;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod records;
pub mod store;
pub mod transfer;

pub use config::{CoreConfig, StoreCredential};
pub use consent::{ConsentBranch, ConsentState};
pub use consent_types::{RecordId, TextError};
pub use dispatch::{ConsentDispatcher, DispatchOutcome};
pub use error::{BridgeError, BridgeResult};
pub use health::{Connectivity, ConnectivityCheck};
pub use records::{NotificationUpdate, Record, SourceRecord, TargetRecord};
pub use store::{memory::InMemoryRecordStore, redcap::RedcapClient, RecordStore, Store};
pub use transfer::{TransferOutcome, TransferResult, TransferService};
