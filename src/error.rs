//! Centralized error handling module
//!
//! Domain errors returned by the store and gateway, plus the unified HTTP
//! response mapping for the API surface.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors produced by the telemetry core
///
/// All variants are recoverable and returned to the caller; none of them
/// terminates the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("sensor '{0}' is already registered")]
    AlreadyExists(String),

    #[error("sensor '{0}' is not registered")]
    NotFound(String),

    #[error(
        "out-of-order reading for sensor '{sensor_id}': {incoming} precedes latest {latest}"
    )]
    OutOfOrder {
        sensor_id: String,
        incoming: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("invalid reading: {0}")]
    InvalidValue(String),
}

/// Application-wide error types for the HTTP layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Standardized error response format
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Unique correlation ID for tracing
    pub correlation_id: String,
    /// Error type classification
    pub error_type: String,
    /// Human-readable error message (safe for clients)
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
    /// Timestamp of the error
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str, status_code: StatusCode) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            error_type: error_type.to_string(),
            message: message.to_string(),
            status_code: status_code.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Store(StoreError::AlreadyExists(_)) => {
                (StatusCode::CONFLICT, "ALREADY_EXISTS", self.to_string())
            }
            AppError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            AppError::Store(StoreError::OutOfOrder { .. }) => {
                (StatusCode::CONFLICT, "OUT_OF_ORDER", self.to_string())
            }
            AppError::Store(StoreError::InvalidValue(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_VALUE", self.to_string())
            }
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InternalError(msg) => {
                // Log internal errors but return safe message to client
                error!(error = %msg, "Internal server error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = self.parts();
        let error_response = ErrorResponse::new(error_type, &message, status);

        error!(
            correlation_id = %error_response.correlation_id,
            error_type = %error_type,
            status_code = %status.as_u16(),
            "Error response generated"
        );

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_maps_to_conflict() {
        let error = AppError::from(StoreError::AlreadyExists("sensor-001".to_string()));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let error = AppError::from(StoreError::NotFound("sensor-404".to_string()));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_out_of_order_maps_to_conflict() {
        let now = Utc::now();
        let error = AppError::from(StoreError::OutOfOrder {
            sensor_id: "sensor-001".to_string(),
            incoming: now - chrono::Duration::seconds(10),
            latest: now,
        });
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_value_maps_to_bad_request() {
        let error = AppError::from(StoreError::InvalidValue("temperature NaN".to_string()));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_response_format() {
        let response = ErrorResponse::new("TEST_ERROR", "Test message", StatusCode::BAD_REQUEST);
        assert!(!response.correlation_id.is_empty());
        assert_eq!(response.error_type, "TEST_ERROR");
        assert_eq!(response.message, "Test message");
        assert_eq!(response.status_code, 400);
    }
}
