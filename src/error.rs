//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the error type of the REST surface and of the
//! WebSocket accept path. [`RelayError`] covers per-connection relay
//! failures; those stay local to one connection and only reach HTTP when
//! an accept is refused.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: 7",
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
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure relaying to, or accepting, a single connection.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The recipient's outbound queue is full; it is not keeping up.
    #[error("send queue full for connection {0}")]
    SendQueueFull(ConnectionId),

    /// The recipient's writer has already shut down.
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// No connection slot is available.
    #[error("connection limit of {0} reached")]
    ConnectionLimit(usize),
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server          | 500 Internal / 503 Unavailable |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(i64),

    /// Event type with the given ID was not found.
    #[error("event type not found: {0}")]
    EventTypeNotFound(i64),

    /// No event type carries the given name.
    #[error("no event type named {0:?}")]
    EventTypeNameNotFound(String),

    /// The request conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Relay failure surfaced to the accept path.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::EventTypeNotFound(_) => 2002,
            Self::EventTypeNameNotFound(_) => 2003,
            Self::Conflict(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Relay(RelayError::ConnectionLimit(_)) => 3002,
            Self::Relay(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_)
            | Self::EventTypeNotFound(_)
            | Self::EventTypeNameNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Relay(RelayError::ConnectionLimit(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PersistenceError(_) | Self::Relay(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for GatewayError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            GatewayError::EventNotFound(1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::EventTypeNameNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(GatewayError::EventTypeNotFound(3).error_code(), 2002);
    }

    #[test]
    fn connection_limit_is_service_unavailable() {
        let err = GatewayError::from(RelayError::ConnectionLimit(8));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), 3002);
        assert_eq!(err.to_string(), "connection limit of 8 reached");
    }

    #[test]
    fn into_response_sets_status() {
        let response = GatewayError::Conflict("name taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
