//! Error types for the Observer API layer.
//!
//! [`ObserverError`] converts into an Axum HTTP response via its
//! [`IntoResponse`] implementation, so handlers can propagate with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// No snapshot has been adopted yet (startup, or every fetch so
    /// far has failed). Viewers should retry shortly.
    #[error("no dashboard data yet")]
    NoData,
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NoData => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
