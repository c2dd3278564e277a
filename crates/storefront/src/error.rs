//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All API handlers return
//! `Result<T, AppError>`; every failure is rendered as the JSON envelope
//! `{"error": <message>, "code": <CODE>}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{ErrorCode, ServiceError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog or cart operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Request body was not valid JSON.
    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub code: &'static str,
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Slug conflicts are reported as 400, not 409, to stay compatible with
    /// existing clients.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation(_) | ServiceError::Conflict(_))
            | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope sent to the client. Internal details are never included.
    #[must_use]
    pub const fn body(&self) -> ErrorBody {
        match self {
            Self::Service(err) => ErrorBody {
                error: err.public_message(),
                code: err.code(),
            },
            Self::Json(_) => ErrorBody {
                error: ErrorCode::InvalidBody.message(),
                code: ErrorCode::InvalidBody.as_str(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
