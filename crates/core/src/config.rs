//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The services never read process-wide environment variables
//! themselves; binaries collect the raw values and hand them to the parsing helpers below.

use crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::{BridgeError, BridgeResult};
use reqwest::Url;
use std::time::Duration;

/// A static API token for one record store.
///
/// The token is never printed: `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreCredential(String);

impl StoreCredential {
    pub fn new(token: impl AsRef<str>) -> BridgeResult<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(BridgeError::Config("store credential cannot be empty".into()));
        }
        Ok(Self(token.to_owned()))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for StoreCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreCredential(<redacted>)")
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_url: Url,
    source_credential: StoreCredential,
    target_credential: StoreCredential,
    request_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` if:
    /// - `api_url` is not an absolute http(s) URL,
    /// - both stores were given the same credential,
    /// - `request_timeout` is zero.
    pub fn new(
        api_url: &str,
        source_credential: StoreCredential,
        target_credential: StoreCredential,
        request_timeout: Duration,
    ) -> BridgeResult<Self> {
        let api_url = Url::parse(api_url.trim())
            .map_err(|e| BridgeError::Config(format!("invalid record API URL: {e}")))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(BridgeError::Config(
                "record API URL must use http or https".into(),
            ));
        }

        if source_credential == target_credential {
            return Err(BridgeError::Config(
                "source and target credentials must differ".into(),
            ));
        }

        if request_timeout.is_zero() {
            return Err(BridgeError::Config("request timeout must be positive".into()));
        }

        Ok(Self {
            api_url,
            source_credential,
            target_credential,
            request_timeout,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn source_credential(&self) -> &StoreCredential {
        &self.source_credential
    }

    pub fn target_credential(&self) -> &StoreCredential {
        &self.target_credential
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Require a non-empty value for the named setting.
pub fn required_env_value(name: &str, value: Option<String>) -> BridgeResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BridgeError::Config(format!("{name} must be set and non-empty")))
}

/// Parse the request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> BridgeResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    };

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(BridgeError::Config(format!(
            "request timeout must be a positive number of seconds, got {value:?}"
        ))),
    }
}

/// Interpret an optional boolean flag (`1`, `true`, `yes`, `on`).
pub fn flag_from_env_value(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().to_ascii_lowercase())
        .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
}

pub const ENV_API_URL: &str = "REDCAP_API_URL";
pub const ENV_SOURCE_TOKEN: &str = "REDCAP_SOURCE_TOKEN";
pub const ENV_TARGET_TOKEN: &str = "REDCAP_TARGET_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "REDCAP_TIMEOUT_SECS";

/// Build a `CoreConfig` by looking each setting up by name.
///
/// Binaries pass `|name| std::env::var(name).ok()`; tests pass a fixed map.
pub fn core_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> BridgeResult<CoreConfig> {
    core_config_from_env_values(
        lookup(ENV_API_URL),
        lookup(ENV_SOURCE_TOKEN),
        lookup(ENV_TARGET_TOKEN),
        lookup(ENV_TIMEOUT_SECS),
    )
}

/// Build a `CoreConfig` from raw (optional) environment values.
pub fn core_config_from_env_values(
    api_url: Option<String>,
    source_token: Option<String>,
    target_token: Option<String>,
    timeout_secs: Option<String>,
) -> BridgeResult<CoreConfig> {
    let api_url = required_env_value(ENV_API_URL, api_url)?;
    let source = StoreCredential::new(required_env_value(ENV_SOURCE_TOKEN, source_token)?)?;
    let target = StoreCredential::new(required_env_value(ENV_TARGET_TOKEN, target_token)?)?;
    let timeout = request_timeout_from_env_value(timeout_secs)?;

    CoreConfig::new(&api_url, source, target, timeout)
}
