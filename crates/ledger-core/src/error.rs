//! # Error Types
//!
//! Domain-specific error types for ledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ledger-core errors (this file)                                        │
//! │  ├── CoreError        - Discount rule violations                       │
//! │  └── ValidationError  - One field failed an input check                │
//! │                                                                         │
//! │  ledger-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What a ledger caller sees                      │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - Serialized JSON body + status code             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, limit)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Discount rule errors.
///
/// These errors represent business rule violations. The ledger service
/// translates them into its caller-facing taxonomy.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Discount cannot be found in the caller's store scope.
    ///
    /// ## When This Occurs
    /// - Discount ID doesn't exist
    /// - Discount belongs to another store (presented identically)
    #[error("Discount not found: {0}")]
    DiscountNotFound(String),

    /// Neither the caller context nor the payload names a store.
    #[error("Store ID is required")]
    StoreRequired,

    /// Discount has no usage headroom left.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout completes with code SUMMER10
    ///      │
    ///      ▼
    /// increment usage: count=100, limit=100
    ///      │
    ///      ▼
    /// UsageLimitReached { code: "SUMMER10", limit: 100 }
    ///      │
    ///      ▼
    /// UI shows: "Discount usage limit reached"
    /// ```
    #[error("Discount usage limit reached for {code} (limit {limit})")]
    UsageLimitReached { code: String, limit: i64 },

    /// Several fields failed validation at once.
    #[error("Validation failed: {}", join_messages(.0))]
    InvalidFields(Vec<ValidationError>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before anything touches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, bad characters in a code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields contradict each other (e.g., window ends before it starts).
    #[error("{field} must not be before {other}")]
    OutOfOrder { field: String, other: String },
}

impl ValidationError {
    /// Name of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::OutOfOrder { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UsageLimitReached {
            code: "SUMMER10".to_string(),
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Discount usage limit reached for SUMMER10 (limit 100)"
        );
        assert_eq!(CoreError::StoreRequired.to_string(), "Store ID is required");
    }

    #[test]
    fn test_invalid_fields_joins_messages() {
        let err = CoreError::InvalidFields(vec![
            ValidationError::Required {
                field: "name".to_string(),
            },
            ValidationError::Required {
                field: "code".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: name is required; code is required"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(validation_err.field(), "code");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
