//! # Validation Module
//!
//! Input validation for discount records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (ledger-api)                                   │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── Header parsing (role, store)                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Typed inputs (ledger-core::input)                            │
//! │  └── THIS MODULE: field rules, collected into one error list           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (usage_count <= usage_limit)                    │
//! │  └── UNIQUE (store_id, code)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-field validators return the first problem they find.
//! [`validate_discount`] runs every rule against a whole record and
//! returns all failures at once.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, ValidationError};
use crate::money::{Money, BPS_PER_PERCENT, BPS_SCALE};
use crate::types::{Discount, DiscountType};
use crate::{MAX_CODE_LENGTH, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a discount name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a discount code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use ledger_core::validation::validate_code;
///
/// assert!(validate_code("SUMMER-10").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("TEN OFF").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a store identifier.
pub fn validate_store_id(store_id: &str) -> ValidationResult<()> {
    if store_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "store".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Largest whole number an `f64` represents exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Validates a stored discount value for its type.
///
/// ## Rules
/// - Never negative
/// - Percentage values are basis points and stop at 10000 (100%)
///
/// Errors report the bound in caller units (percent for percentages).
pub fn validate_value(discount_type: DiscountType, value: i64) -> ValidationResult<()> {
    let (max, shown_max) = match discount_type {
        DiscountType::Percentage => (BPS_SCALE, BPS_SCALE / BPS_PER_PERCENT),
        DiscountType::FixedAmount => (i64::MAX, i64::MAX),
    };

    if !(0..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 0,
            max: shown_max,
        });
    }

    Ok(())
}

/// Converts a caller-facing value into stored units.
///
/// ## Rules
/// - Percentage: 0 to 100 percent, kept to one basis point (0.01%)
/// - Fixed amount: whole cents, never negative
///
/// ## Example
/// ```rust
/// use ledger_core::validation::value_to_units;
/// use ledger_core::DiscountType;
///
/// assert_eq!(value_to_units(DiscountType::Percentage, 10.5), Ok(1_050));
/// assert_eq!(value_to_units(DiscountType::FixedAmount, 500.0), Ok(500));
/// assert!(value_to_units(DiscountType::Percentage, 101.0).is_err());
/// assert!(value_to_units(DiscountType::FixedAmount, 2.5).is_err());
/// ```
pub fn value_to_units(discount_type: DiscountType, value: f64) -> ValidationResult<i64> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "value".to_string(),
            reason: "must be a number".to_string(),
        });
    }

    match discount_type {
        DiscountType::Percentage => {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: BPS_SCALE / BPS_PER_PERCENT,
                });
            }
            Ok((value * BPS_PER_PERCENT as f64).round() as i64)
        }
        DiscountType::FixedAmount => {
            if !(0.0..=MAX_EXACT_F64).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: MAX_EXACT_F64 as i64,
                });
            }
            if value.fract() != 0.0 {
                return Err(ValidationError::InvalidFormat {
                    field: "value".to_string(),
                    reason: "fixed amounts are whole cents".to_string(),
                });
            }
            Ok(value as i64)
        }
    }
}

/// Validates a minimum purchase amount in cents (must be ≥ 0).
pub fn validate_min_purchase_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "minPurchaseAmount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a usage limit (must be ≥ 1 when present).
pub fn validate_usage_limit(limit: i64) -> ValidationResult<()> {
    if limit < 1 {
        return Err(ValidationError::OutOfRange {
            field: "usageLimit".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an amount recorded by usage accounting.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (free-shipping style codes)
pub fn validate_usage_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Window Validators
// =============================================================================

/// Validates that a validity window does not end before it starts.
pub fn validate_window(valid_from: DateTime<Utc>, valid_to: DateTime<Utc>) -> ValidationResult<()> {
    if valid_to < valid_from {
        return Err(ValidationError::OutOfOrder {
            field: "validTo".to_string(),
            other: "validFrom".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use ledger_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Record Validation
// =============================================================================

/// Runs every field rule against a complete discount record.
///
/// Used after an update is merged so cross-field rules (window order,
/// percentage cap after a type change) see the final values.
pub fn validate_discount(discount: &Discount) -> Result<(), CoreError> {
    let mut errors = Vec::new();

    collect(&mut errors, validate_name(&discount.name));
    collect(&mut errors, validate_code(&discount.code));
    collect(&mut errors, validate_store_id(&discount.store_id));
    collect(
        &mut errors,
        validate_value(discount.discount_type, discount.value),
    );
    if let Some(min) = discount.min_purchase_cents {
        collect(&mut errors, validate_min_purchase_cents(min));
    }
    if let Some(limit) = discount.usage_limit {
        collect(&mut errors, validate_usage_limit(limit));
        // A limit below the recorded usage would leave the row over its cap.
        if limit >= 1 && limit < discount.usage_count {
            errors.push(ValidationError::OutOfRange {
                field: "usageLimit".to_string(),
                min: discount.usage_count,
                max: i64::MAX,
            });
        }
    }
    collect(
        &mut errors,
        validate_window(discount.valid_from, discount.valid_to),
    );

    into_result(errors)
}

/// Pushes the error of a failed check onto `errors`.
pub(crate) fn collect(errors: &mut Vec<ValidationError>, result: ValidationResult<()>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

pub(crate) fn into_result(errors: Vec<ValidationError>) -> Result<(), CoreError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
