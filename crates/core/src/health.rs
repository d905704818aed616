//! Startup connectivity probe for the record API server.
//!
//! This is not used by the transfer or dispatch services. Binaries call it once at startup to
//! log whether the API host answers over TLS; a failure is reported, never fatal.

use crate::config::CoreConfig;
use crate::constants::CONNECTIVITY_CHECK_TIMEOUT_SECS;
use crate::{BridgeError, BridgeResult};
use reqwest::Url;
use std::time::Duration;

/// Result of one connectivity probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// The server answered with this HTTP status.
    Reachable(u16),
    /// The request failed before a status was received.
    Unreachable(String),
}

#[derive(Clone, Debug)]
pub struct ConnectivityCheck {
    http: reqwest::Client,
    probe_url: Url,
}

impl ConnectivityCheck {
    pub fn new(cfg: &CoreConfig) -> BridgeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONNECTIVITY_CHECK_TIMEOUT_SECS))
            .build()
            .map_err(BridgeError::HttpClient)?;

        Ok(Self {
            http,
            probe_url: probe_url(cfg.api_url()),
        })
    }

    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    pub async fn check(&self) -> Connectivity {
        match self.http.get(self.probe_url.clone()).send().await {
            Ok(response) => Connectivity::Reachable(response.status().as_u16()),
            Err(e) => Connectivity::Unreachable(e.to_string()),
        }
    }
}

/// The server root for an API URL: everything before the first `api/` path segment.
///
/// URLs without an `api/` segment are probed as-is.
pub fn probe_url(api_url: &Url) -> Url {
    let text = api_url.as_str();
    match text.find("api/") {
        Some(idx) => Url::parse(&text[..idx]).unwrap_or_else(|_| api_url.clone()),
        None => api_url.clone(),
    }
}
