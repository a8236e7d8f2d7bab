//! HTTP mapping for coordinator failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::capture::CaptureError;

/// A plain-text HTTP error response.
///
/// Validation failures are client errors; everything else (cache I/O,
/// render failures, timeouts) is a server error carrying the cause.
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl From<CaptureError> for HttpError {
    fn from(err: CaptureError) -> Self {
        let status = match err {
            CaptureError::MissingUrl => StatusCode::BAD_REQUEST,
            CaptureError::Cache(_) | CaptureError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
