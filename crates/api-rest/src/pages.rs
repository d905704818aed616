//! HTML pages shown to research staff after each step.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use consent_core::{DispatchOutcome, TransferOutcome};

/// Page shown after a record has been transferred, offering the consent follow-up.
#[derive(Template)]
#[template(path = "transfer.html")]
pub struct TransferPage<'a> {
    pub record_id: &'a str,
    pub consent: &'a str,
    pub consent_code: &'a str,
    pub write_back_warning: bool,
    pub upstream_status: u16,
}

impl<'a> TransferPage<'a> {
    pub fn new(outcome: &'a TransferOutcome) -> Self {
        let result = outcome.result();
        Self {
            record_id: result.record_id.as_str(),
            consent: result.consent_state.as_str(),
            consent_code: &result.consent_code,
            write_back_warning: outcome.has_upstream_warning(),
            upstream_status: outcome.upstream_status(),
        }
    }
}

/// Page shown after a consent alert dispatch.
#[derive(Template)]
#[template(path = "dispatch.html")]
pub struct DispatchPage<'a> {
    pub record_id: &'a str,
    pub outcome: &'static str,
    pub detail: String,
}

impl<'a> DispatchPage<'a> {
    pub fn new(record_id: &'a str, outcome: &DispatchOutcome) -> Self {
        let (outcome, detail) = match outcome {
            DispatchOutcome::Dispatched(branch) => ("dispatched", branch.as_str().to_string()),
            DispatchOutcome::NoActionTaken { consent_code } => ("no-action", consent_code.clone()),
            DispatchOutcome::DispatchFailed { status, .. } => ("failed", status.to_string()),
        };
        Self {
            record_id,
            outcome,
            detail,
        }
    }
}

/// Render a template, mapping a rendering failure to a 500.
pub fn render(template: &impl Template) -> Response {
    match template.render() {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
