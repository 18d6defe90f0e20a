//! Mapping crate errors onto HTTP responses.

use crate::LicenseGateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// A [`LicenseGateError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub LicenseGateError);

impl From<LicenseGateError> for ApiError {
    fn from(err: LicenseGateError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error.
///
/// Store failures are 503 so a verification outage can never be read as a
/// normal negative answer.
pub fn status_for(err: &LicenseGateError) -> StatusCode {
    match err {
        LicenseGateError::Validation(_) => StatusCode::BAD_REQUEST,
        LicenseGateError::NotFound { .. } => StatusCode::NOT_FOUND,
        LicenseGateError::Unauthorized => StatusCode::UNAUTHORIZED,
        LicenseGateError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LicenseGateError::ConfigError(_)
        | LicenseGateError::Transport(_)
        | LicenseGateError::ProtocolError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&LicenseGateError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&LicenseGateError::NotFound { id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LicenseGateError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&LicenseGateError::StoreUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError(LicenseGateError::NotFound { id: 4 }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
