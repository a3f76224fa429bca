//! Server error types with HTTP status code mapping.
//!
//! [`SyncError`] is the central error type of the server. Per-message
//! failures on a WebSocket are logged and swallowed by the session; the
//! same variants surface through the REST API as structured JSON errors.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DispatchError, ObjectId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "message": "value 'wide' does not fit property 'width' of type float",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`SyncError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 4000–4999 | Property write  | 422 Unprocessable Entity     |
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Scene object with the given id was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A property write was rejected by the dispatch engine.
    #[error("property dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The listening socket could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a server that is already running.
    #[error("server already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// The scene seed could not be loaded.
    #[error("scene error: {0}")]
    Scene(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ObjectNotFound(_) => 2001,
            Self::AlreadyRunning(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Bind { .. } => 3001,
            Self::Scene(_) => 3002,
            Self::Dispatch(err) => match err {
                DispatchError::NoSetterFound { .. } => 4001,
                DispatchError::TypeMismatch { .. } => 4002,
                DispatchError::NullNotAllowed { .. } => 4003,
                DispatchError::ObjectNotFound(_) => 2001,
            },
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ObjectNotFound(_) | Self::Dispatch(DispatchError::ObjectNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::AlreadyRunning(_) => StatusCode::CONFLICT,
            Self::Dispatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Bind { .. } | Self::Scene(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
