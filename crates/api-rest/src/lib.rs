//! # API REST
//!
//! HTTP surface for consent-sync.
//!
//! Handles:
//! - `GET /transfer?record=<id>`: transfer a record and render the consent follow-up page
//! - `POST /trigger-email` (form field `rec_id`): fire the matching consent alert
//! - `GET /health` and OpenAPI/Swagger documentation
//!
//! Status codes: 400 for a missing identifier, 404 when the source store has no such record,
//! 500 for upstream failures, 200 otherwise (including when no alert was needed).

#![warn(rust_2018_idioms)]

pub mod error;
pub mod pages;

use axum::{
    extract::{Form, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use consent_core::{
    config::{core_config_from_lookup, flag_from_env_value},
    BridgeResult, Connectivity, ConnectivityCheck, ConsentDispatcher, CoreConfig, RecordStore,
    TransferService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;
use pages::{render, DispatchPage, TransferPage};

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    transfer: TransferService,
    dispatcher: ConsentDispatcher,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            transfer: TransferService::new(store.clone()),
            dispatcher: ConsentDispatcher::new(store),
        }
    }
}

/// Health check response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransferQuery {
    /// Identifier of the record to transfer.
    pub record: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerForm {
    /// Identifier of a record that has already been transferred.
    pub rec_id: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, transfer, trigger_email),
    components(schemas(HealthRes, TriggerForm))
)]
struct ApiDoc;

/// Build the REST router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transfer", get(transfer))
        .route("/trigger-email", post(trigger_email))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve the core configuration from the process environment.
///
/// # Errors
///
/// Returns `BridgeError::Config` if the API URL or either store token is missing, blank or
/// invalid.
pub fn core_config_from_env() -> BridgeResult<CoreConfig> {
    core_config_from_lookup(|name| std::env::var(name).ok())
}

/// Probe the record API host once and log the result, unless disabled by
/// `CONSENT_SKIP_CONNECTIVITY_CHECK`.
pub async fn log_connectivity(cfg: &CoreConfig) {
    if flag_from_env_value(std::env::var("CONSENT_SKIP_CONNECTIVITY_CHECK").ok()) {
        tracing::info!("-- Skipping REDCap connectivity check");
        return;
    }

    let check = match ConnectivityCheck::new(cfg) {
        Ok(check) => check,
        Err(e) => {
            tracing::warn!("Could not build connectivity check: {}", e);
            return;
        }
    };

    match check.check().await {
        Connectivity::Reachable(status) => {
            tracing::info!("REDCap connection check: {} - {}", status, check.probe_url())
        }
        Connectivity::Unreachable(reason) => {
            tracing::warn!("Could not verify REDCap connection: {}", reason)
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "consent-sync REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/transfer",
    params(TransferQuery),
    responses(
        (status = 200, description = "Record transferred; consent follow-up page", body = String, content_type = "text/html"),
        (status = 400, description = "No record ID provided"),
        (status = 404, description = "Record not found in the source project"),
        (status = 500, description = "Upstream failure")
    )
)]
/// Transfer a screened participant from the source project to the consent project
///
/// Renders a page offering the follow-up that matches the participant's consent preference.
#[axum::debug_handler]
async fn transfer(
    State(state): State<AppState>,
    Query(query): Query<TransferQuery>,
) -> Result<Response, ApiError> {
    let record_id = query.record.unwrap_or_default();
    let outcome = state.transfer.transfer(&record_id).await?;
    Ok(render(&TransferPage::new(&outcome)))
}

#[utoipa::path(
    post,
    path = "/trigger-email",
    request_body(content = TriggerForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Alert triggered, not needed, or rejected by REDCap", body = String, content_type = "text/html"),
        (status = 400, description = "No record ID provided"),
        (status = 500, description = "Record could not be read back, or upstream failure")
    )
)]
/// Fire the consent alert for a transferred record
#[axum::debug_handler]
async fn trigger_email(
    State(state): State<AppState>,
    form: Option<Form<TriggerForm>>,
) -> Result<Response, ApiError> {
    let record_id = form
        .and_then(|Form(form)| form.rec_id)
        .unwrap_or_default();
    let outcome = state.dispatcher.dispatch(&record_id).await?;
    Ok(render(&DispatchPage::new(&record_id, &outcome)))
}
