//! # API Error Handling
//!
//! Converts ledger errors into JSON HTTP responses.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DiscountLedger ──► LedgerError ──► ApiError ──► HTTP status + JSON    │
//! │                                                                         │
//! │  NotFound      → 404 NOT_FOUND                                         │
//! │  BadRequest    → 400 BAD_REQUEST                                       │
//! │  Validation    → 400 BAD_REQUEST (+ fields)                            │
//! │  Conflict      → 409 CONFLICT                                          │
//! │  Persistence   → 500 DATABASE_ERROR (details logged, not returned)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `VALIDATION_ERROR` (422) is raised by the routes themselves, for
//! bodies naming a discount type or applicability that does not exist.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_core::ValidationError;
use ledger_db::{DbError, LedgerError};
use serde::Serialize;

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// This is what the caller receives when a request fails:
/// ```json
/// {
///   "code": "BAD_REQUEST",
///   "message": "Validation failed: code is required",
///   "fields": [{ "field": "code", "message": "code is required" }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field failures, when the error is about request fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// One field that failed validation.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Request cannot be served as sent (400)
    BadRequest,

    /// Caller identity missing (401)
    Unauthorized,

    /// Body names an unknown enum value (422)
    ValidationError,

    /// Duplicate discount code (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Database unreachable (503)
    Unavailable,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("Discount not found: {}", id))
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a bad request error listing every failed field rule.
    pub fn invalid_fields(message: impl Into<String>, errors: &[ValidationError]) -> Self {
        ApiError {
            code: ErrorCode::BadRequest,
            message: message.into(),
            fields: errors.iter().map(FieldError::from).collect(),
        }
    }

    /// Creates a schema validation error, such as an unknown enum value.
    pub fn validation(message: impl Into<String>, errors: &[ValidationError]) -> Self {
        ApiError {
            code: ErrorCode::ValidationError,
            message: message.into(),
            fields: errors.iter().map(FieldError::from).collect(),
        }
    }
}

/// Converts ledger errors to API errors.
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => ApiError::not_found(&id),
            LedgerError::BadRequest(message) => ApiError::bad_request(message),
            LedgerError::Validation(ref errors) => ApiError::invalid_fields(err.to_string(), errors),
            LedgerError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            LedgerError::Persistence(db_err) => ApiError::from(db_err),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { id, .. } => ApiError::not_found(&id),
            DbError::UniqueViolation { .. } => ApiError::new(
                ErrorCode::Conflict,
                "A discount with this code already exists",
            ),
            DbError::PoolExhausted => {
                tracing::warn!("Database pool exhausted");
                ApiError::new(ErrorCode::Unavailable, "Database busy, retry later")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::Unavailable, "Database unavailable")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_statuses() {
        let cases = [
            (LedgerError::NotFound("d1".to_string()), StatusCode::NOT_FOUND),
            (
                LedgerError::BadRequest("Store ID is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (LedgerError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (LedgerError::Conflict("dup".to_string()), StatusCode::CONFLICT),
            (
                LedgerError::Persistence(DbError::QueryFailed("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_persistence_details_are_not_returned() {
        let api = ApiError::from(LedgerError::Persistence(DbError::QueryFailed(
            "no such column: secret".to_string(),
        )));
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_field_rule_failures_are_bad_requests_with_fields() {
        let api = ApiError::from(LedgerError::Validation(vec![ValidationError::Required {
            field: "code".to_string(),
        }]));
        assert_eq!(api.code.status(), StatusCode::BAD_REQUEST);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["fields"][0]["field"], "code");
    }

    #[test]
    fn test_schema_errors_are_unprocessable() {
        let api = ApiError::validation(
            "Validation failed: type must be one of: [\"PERCENTAGE\", \"FIXED_AMOUNT\"]",
            &[ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["PERCENTAGE".to_string(), "FIXED_AMOUNT".to_string()],
            }],
        );
        assert_eq!(api.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["fields"][0]["field"], "type");
    }

    #[test]
    fn test_non_validation_errors_omit_fields() {
        let json = serde_json::to_value(ApiError::not_found("d1")).unwrap();
        assert!(json.get("fields").is_none());
        assert_eq!(json["message"], "Discount not found: d1");
    }
}
