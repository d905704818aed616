use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use consent_core::BridgeError;

/// Maps core failures onto HTTP responses.
///
/// Client errors carry a short message; upstream failures are logged in full and answered with
/// a generic 500 so no store detail reaches the browser.
#[derive(Debug)]
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            BridgeError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "Error: No record ID provided.".to_string())
                    .into_response()
            }
            BridgeError::NotFound(record_id) => (
                StatusCode::NOT_FOUND,
                format!("Error: Record {record_id} not found in the source project."),
            )
                .into_response(),
            err @ BridgeError::RecordUnavailable { .. } => {
                tracing::error!("Record unavailable: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error: Could not retrieve record details from the consent project."
                        .to_string(),
                )
                    .into_response()
            }
            err => {
                tracing::error!("Upstream error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "System error while contacting REDCap.".to_string(),
                )
                    .into_response()
            }
        }
    }
}
