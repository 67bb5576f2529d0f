//! Error taxonomy with HTTP status code mapping.
//!
//! Three layers, innermost first:
//!
//! - [`StoreError`]: anything the record store adapter can fail with.
//! - [`DashboardError`]: internal failure of a dashboard call, either bad
//!   input or a store failure. Never crosses the service boundary as-is.
//! - [`ServiceError`]: the public, categorized error carried in the
//!   [`ServiceResult`](crate::envelope::ServiceResult) envelope. Store
//!   failures are collapsed into a fixed message here so connection
//!   strings, table names and the like never reach a caller.
//!
//! [`ApiError`] adds the HTTP-only failures (missing identity, role
//! checks) and renders everything as a JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Public message for every [`ErrorCode::DashboardDataError`].
pub const DASHBOARD_DATA_MESSAGE: &str = "Failed to fetch dashboard data";

/// Failure inside a record store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Driver-level database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row could not be mapped into a domain record.
    #[error("decode error: {0}")]
    Decode(String),

    /// The store cannot serve reads right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The filter names a field the target collection does not have.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input; detected before any I/O.
    ValidationError,
    /// Query or assembly failure.
    DashboardDataError,
    /// Malformed HTTP query string or path.
    InvalidRequest,
    /// No caller identity on the request.
    Unauthorized,
    /// Caller's role does not permit the operation.
    Forbidden,
}

impl ErrorCode {
    /// Wire representation, e.g. `"VALIDATION_ERROR"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DashboardDataError => "DASHBOARD_DATA_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// HTTP status for this category.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::ValidationError | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DashboardDataError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Public error payload.
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Missing required parameters",
///   "details": { "missingFields": ["userId"] },
///   "timestamp": "2024-01-31T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceError {
    /// Error category.
    pub code: ErrorCode,
    /// Human-readable message. Never contains store internals.
    pub message: String,
    /// Structured details; only set for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
}

impl ServiceError {
    /// Creates an error with no details.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// The opaque data-failure error.
    #[must_use]
    pub fn dashboard_data() -> Self {
        Self::new(ErrorCode::DashboardDataError, DASHBOARD_DATA_MESSAGE)
    }
}

/// Internal failure of a dashboard call.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Input rejected before any I/O.
    #[error("validation failed: {message}")]
    Validation {
        /// Human-readable reason.
        message: String,
        /// Offending option names.
        fields: Vec<&'static str>,
        /// `true` when the fields were absent rather than malformed.
        missing: bool,
    },

    /// A record store call failed during assembly.
    #[error("record store failure: {0}")]
    Store(#[from] StoreError),
}

impl DashboardError {
    /// Builds a [`DashboardError::Validation`] for present but malformed
    /// fields.
    pub fn validation(message: impl Into<String>, fields: &[&'static str]) -> Self {
        Self::Validation {
            message: message.into(),
            fields: fields.to_vec(),
            missing: false,
        }
    }

    /// Builds a [`DashboardError::Validation`] for absent fields.
    pub fn missing(message: impl Into<String>, fields: &[&'static str]) -> Self {
        Self::Validation {
            message: message.into(),
            fields: fields.to_vec(),
            missing: true,
        }
    }

    /// Category of this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Store(_) => ErrorCode::DashboardDataError,
        }
    }
}

impl From<DashboardError> for ServiceError {
    /// Converts to the public form. Store causes are dropped here; log
    /// them before converting.
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Validation {
                message,
                fields,
                missing,
            } => {
                let key = if missing { "missingFields" } else { "invalidFields" };
                let mut details = serde_json::Map::new();
                details.insert(key.to_string(), serde_json::json!(fields));
                Self {
                    code: ErrorCode::ValidationError,
                    message,
                    details: Some(serde_json::Value::Object(details)),
                    timestamp: Utc::now(),
                }
            }
            DashboardError::Store(_) => Self::dashboard_data(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error payload.
    pub error: ServiceError,
}

/// HTTP-layer error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable caller identity.
    #[error("authentication required")]
    Unauthorized,

    /// Caller's role is too low for the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed query string or path segment.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A service call returned a failure envelope.
    #[error("{}", .0.message)]
    Service(ServiceError),
}

impl ApiError {
    /// Error category.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::Service(e) => e.code,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            Self::Service(e) => e,
            other => ServiceError::new(other.code(), other.to_string()),
        };
        let body = ErrorResponse {
            success: false,
            error,
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
