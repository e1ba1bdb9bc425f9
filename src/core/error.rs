//! Typed error handling for the invoice lifecycle operations
//!
//! Synchronous operations always return a structured response. Store
//! precondition failures are mapped to `NotFound`/`Conflict` at the
//! call site; everything unanticipated is caught at the operation
//! boundary, logged with its cause, and surfaced as a generic internal
//! error that leaks no detail to the caller.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::core::document::DocumentError;
use crate::core::queue::QueueError;
use crate::core::store::StoreError;

/// The error taxonomy of the service.
#[derive(Debug)]
pub enum ServiceError {
    /// A required identifier is missing or blank.
    BadRequest { message: String },

    /// The record is absent.
    NotFound { invoice_id: String },

    /// Identifier collision on emit, or a cancel refused by the strict
    /// policy.
    Conflict { invoice_id: String },

    /// Any unanticipated failure. The cause is logged, never returned.
    Internal(String),
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(invoice_id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            invoice_id: invoice_id.into(),
        }
    }

    pub fn internal(cause: impl fmt::Display) -> Self {
        ServiceError::Internal(cause.to_string())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest { .. } => "BAD_REQUEST",
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Conflict { .. } => "CONFLICT",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to the structured response body.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            // The cause stays in the logs.
            ServiceError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        ErrorResponse {
            code: self.error_code().to_string(),
            message,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::BadRequest { message } => write!(f, "{message}"),
            ServiceError::NotFound { invoice_id } => {
                write!(f, "invoice '{invoice_id}' not found")
            }
            ServiceError::Conflict { invoice_id } => {
                write!(f, "conflicting write for invoice '{invoice_id}'")
            }
            ServiceError::Internal(cause) => write!(f, "internal error: {cause}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Error response structure for HTTP responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(cause) = &self {
            tracing::error!(%cause, "request failed");
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

// Backend failures that reach the operation boundary unmapped are
// internal errors. Condition failures must be handled at the call site
// before these conversions apply.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::internal(err)
    }
}

impl From<DocumentError> for ServiceError {
    fn from(err: DocumentError) -> Self {
        ServiceError::internal(err)
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        ServiceError::internal(err)
    }
}

/// A specialized Result type for lifecycle operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
