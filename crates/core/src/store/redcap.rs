//! HTTP client for the REDCap record API.
//!
//! Every call is a form-encoded POST to the single API endpoint. Exports request flat JSON for
//! one record id; imports send a one-element JSON array with `overwriteBehavior=normal`, which
//! leaves fields absent from the payload untouched.

use super::{parse_export, RecordStore, Store, StoreError, StoreResult, UpsertResponse};
use crate::config::{CoreConfig, StoreCredential};
use crate::records::Record;
use crate::{BridgeError, BridgeResult};
use consent_types::RecordId;
use reqwest::Url;

/// [`RecordStore`] backed by the REDCap API.
#[derive(Clone, Debug)]
pub struct RedcapClient {
    http: reqwest::Client,
    api_url: Url,
    source_credential: StoreCredential,
    target_credential: StoreCredential,
}

impl RedcapClient {
    /// Build a client whose calls all carry the configured request timeout.
    pub fn new(cfg: &CoreConfig) -> BridgeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(BridgeError::HttpClient)?;

        Ok(Self {
            http,
            api_url: cfg.api_url().clone(),
            source_credential: cfg.source_credential().clone(),
            target_credential: cfg.target_credential().clone(),
        })
    }

    fn credential(&self, store: Store) -> &StoreCredential {
        match store {
            Store::Source => &self.source_credential,
            Store::Target => &self.target_credential,
        }
    }

    async fn post_form(
        &self,
        store: Store,
        form: &[(&str, &str)],
    ) -> StoreResult<(u16, String)> {
        let response = self
            .http
            .post(self.api_url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                store,
                source: Box::new(e),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| StoreError::Transport {
            store,
            source: Box::new(e),
        })?;

        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl RecordStore for RedcapClient {
    async fn fetch_one(&self, store: Store, record_id: &RecordId) -> StoreResult<Option<Record>> {
        let mut form = vec![
            ("token", self.credential(store).expose()),
            ("content", "record"),
            ("format", "json"),
            ("type", "flat"),
            ("records[0]", record_id.as_str()),
        ];
        if store == Store::Source {
            form.push(("exportSurveyFields", "true"));
        }

        let (status, body) = self.post_form(store, &form).await?;
        if !(200..300).contains(&status) {
            return Err(StoreError::Status {
                store,
                status,
                body,
            });
        }

        parse_export(store, &body)
    }

    async fn upsert(&self, store: Store, record: Record) -> StoreResult<UpsertResponse> {
        let data = serde_json::to_string(&[record])
            .map_err(|source| StoreError::Encode { store, source })?;

        let form = [
            ("token", self.credential(store).expose()),
            ("content", "record"),
            ("format", "json"),
            ("type", "flat"),
            ("overwriteBehavior", "normal"),
            ("data", data.as_str()),
        ];

        let (status, body) = self.post_form(store, &form).await?;
        Ok(UpsertResponse { status, body })
    }
}
