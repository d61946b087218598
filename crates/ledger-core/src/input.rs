//! # Operation Inputs
//!
//! Typed payloads for the mutating ledger operations. Each input is
//! validated here, before the ledger touches the database.
//!
//! ```text
//! HTTP JSON ──► DTO (ledger-api) ──► CreateDiscountInput ──► validate() ──► ledger
//! ```

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{ApplicableTo, Discount, DiscountType};
use crate::validation::{
    collect, into_result, validate_code, validate_min_purchase_cents, validate_name,
    validate_usage_amount, validate_usage_limit, validate_window, value_to_units,
    ValidationResult,
};

// =============================================================================
// Create
// =============================================================================

/// Payload for creating a discount.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDiscountInput {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percent for percentage discounts, cents for fixed amounts.
    pub value: f64,
    pub min_purchase_cents: Option<i64>,
    pub applicable_to: ApplicableTo,
    pub products: Vec<String>,
    pub categories: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Defaults to true.
    pub is_active: Option<bool>,
    /// Used only when the caller context carries no store.
    pub store_id: Option<String>,
    pub usage_limit: Option<i64>,
}

impl CreateDiscountInput {
    /// Minimal input; optional fields take their defaults.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        discount_type: DiscountType,
        value: f64,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Self {
        CreateDiscountInput {
            name: name.into(),
            code: code.into(),
            description: None,
            discount_type,
            value,
            min_purchase_cents: None,
            applicable_to: ApplicableTo::AllProducts,
            products: Vec::new(),
            categories: Vec::new(),
            valid_from,
            valid_to,
            is_active: None,
            store_id: None,
            usage_limit: None,
        }
    }

    /// Checks every field rule and reports all failures together.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = Vec::new();

        collect(&mut errors, validate_name(&self.name));
        collect(&mut errors, validate_code(&self.code));
        collect(
            &mut errors,
            value_to_units(self.discount_type, self.value).map(|_| ()),
        );
        if let Some(min) = self.min_purchase_cents {
            collect(&mut errors, validate_min_purchase_cents(min));
        }
        if let Some(limit) = self.usage_limit {
            collect(&mut errors, validate_usage_limit(limit));
        }
        collect(&mut errors, validate_window(self.valid_from, self.valid_to));

        into_result(errors)
    }

    /// Builds the record to insert. Counters start at zero.
    pub fn into_discount(
        self,
        id: String,
        store_id: String,
        now: DateTime<Utc>,
    ) -> Result<Discount, CoreError> {
        let value = value_to_units(self.discount_type, self.value)?;

        Ok(Discount {
            id,
            name: self.name.trim().to_string(),
            code: self.code.trim().to_string(),
            description: self.description,
            discount_type: self.discount_type,
            value,
            min_purchase_cents: self.min_purchase_cents,
            applicable_to: self.applicable_to,
            products: self.products,
            categories: self.categories,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            is_active: self.is_active.unwrap_or(true),
            store_id,
            usage_limit: self.usage_limit,
            usage_count: 0,
            total_discount: Money::zero(),
            created_at: now,
            updated_at: now,
        })
    }
}

// =============================================================================
// Update
// =============================================================================

/// Partial update. `None` leaves a field unchanged.
///
/// Nullable fields are doubled: `Some(None)` clears the stored value,
/// so a usage cap or minimum purchase can be removed again.
///
/// Owner store and the usage counters are not editable here; counters
/// only move through usage accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDiscountInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<Option<String>>,
    pub discount_type: Option<DiscountType>,
    /// Caller units, read against the type after the merge.
    pub value: Option<f64>,
    pub min_purchase_cents: Option<Option<i64>>,
    pub applicable_to: Option<ApplicableTo>,
    pub products: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub usage_limit: Option<Option<i64>>,
}

impl UpdateDiscountInput {
    /// Checks whether the update changes anything.
    pub fn is_empty(&self) -> bool {
        *self == UpdateDiscountInput::default()
    }

    /// Merges the present fields into `discount`.
    ///
    /// A type change without a new value keeps the number the caller
    /// sees, so fixed 500 (cents) becomes 500 percent and is rejected.
    /// Nothing is written when the value cannot be converted.
    pub fn apply(self, discount: &mut Discount) -> ValidationResult<()> {
        let discount_type = self.discount_type.unwrap_or(discount.discount_type);
        let units = match (self.value, self.discount_type) {
            (Some(value), _) => Some(value_to_units(discount_type, value)?),
            (None, Some(_)) => {
                let shown = discount.discount_type.value_from_units(discount.value);
                Some(value_to_units(discount_type, shown)?)
            }
            (None, None) => None,
        };

        discount.discount_type = discount_type;
        if let Some(units) = units {
            discount.value = units;
        }
        if let Some(name) = self.name {
            discount.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            discount.code = code.trim().to_string();
        }
        if let Some(description) = self.description {
            discount.description = description;
        }
        if let Some(min) = self.min_purchase_cents {
            discount.min_purchase_cents = min;
        }
        if let Some(applicable_to) = self.applicable_to {
            discount.applicable_to = applicable_to;
        }
        if let Some(products) = self.products {
            discount.products = products;
        }
        if let Some(categories) = self.categories {
            discount.categories = categories;
        }
        if let Some(valid_from) = self.valid_from {
            discount.valid_from = valid_from;
        }
        if let Some(valid_to) = self.valid_to {
            discount.valid_to = valid_to;
        }
        if let Some(is_active) = self.is_active {
            discount.is_active = is_active;
        }
        if let Some(limit) = self.usage_limit {
            discount.usage_limit = limit;
        }

        Ok(())
    }
}

// =============================================================================
// Usage
// =============================================================================

/// Amount taken off one completed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementUsageInput {
    pub amount: Money,
}

impl IncrementUsageInput {
    pub fn new(amount: Money) -> Self {
        IncrementUsageInput { amount }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_usage_amount(self.amount)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
