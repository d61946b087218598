//! # Domain Types
//!
//! Core domain types used throughout the discount ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │      Discount       │   │  DiscountType   │   │  ApplicableTo   │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  id (UUID)          │   │  Percentage     │   │  AllProducts    │   │
//! │  │  code (business)    │   │  FixedAmount    │   │  Specific…      │   │
//! │  │  store_id (owner)   │   └─────────────────┘   └─────────────────┘   │
//! │  │  valid_from/to      │                                                │
//! │  │  usage_count/limit  │   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │  total_discount     │   │  CallerContext  │   │  PageRequest    │   │
//! │  └─────────────────────┘   │  role, store_id │   │  page, limit    │   │
//! │                            └─────────────────┘   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every discount has:
//! - `id`: UUID v4 - immutable, used for lookups and usage accounting
//! - `code`: what the cashier types at checkout, unique per store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, BPS_PER_PERCENT, BPS_SCALE};
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Discount Type
// =============================================================================

/// How a discount's `value` is interpreted.
///
/// ## Units
/// ```text
///              caller sends / receives     stored in Discount::value
/// Percentage   percent, 0..=100 (10.5)     basis points (1050)
/// FixedAmount  whole cents (500)           cents (500)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

impl DiscountType {
    /// Wire name, as stored in the database and sent over JSON.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "PERCENTAGE",
            DiscountType::FixedAmount => "FIXED_AMOUNT",
        }
    }

    /// Every accepted wire name.
    pub fn allowed() -> Vec<String> {
        vec![
            DiscountType::Percentage.as_str().to_string(),
            DiscountType::FixedAmount.as_str().to_string(),
        ]
    }

    /// Caller-facing value of stored `units`: percent for percentage
    /// discounts (1050 → 10.5), cents for fixed amounts.
    ///
    /// The inverse, with its range checks, is
    /// [`value_to_units`](crate::validation::value_to_units).
    pub fn value_from_units(self, units: i64) -> f64 {
        match self {
            DiscountType::Percentage => units as f64 / BPS_PER_PERCENT as f64,
            DiscountType::FixedAmount => units as f64,
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PERCENTAGE" => Ok(DiscountType::Percentage),
            "FIXED_AMOUNT" => Ok(DiscountType::FixedAmount),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: DiscountType::allowed(),
            }),
        }
    }
}

// =============================================================================
// Applicability
// =============================================================================

/// Which items of a sale a discount applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicableTo {
    #[default]
    AllProducts,
    /// Only products listed in `Discount::products`.
    SpecificProducts,
    /// Only products whose category is listed in `Discount::categories`.
    SpecificCategories,
}

impl ApplicableTo {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ApplicableTo::AllProducts => "ALL_PRODUCTS",
            ApplicableTo::SpecificProducts => "SPECIFIC_PRODUCTS",
            ApplicableTo::SpecificCategories => "SPECIFIC_CATEGORIES",
        }
    }

    pub fn allowed() -> Vec<String> {
        [
            ApplicableTo::AllProducts,
            ApplicableTo::SpecificProducts,
            ApplicableTo::SpecificCategories,
        ]
        .iter()
        .map(|a| a.as_str().to_string())
        .collect()
    }
}

impl std::str::FromStr for ApplicableTo {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ALL_PRODUCTS" => Ok(ApplicableTo::AllProducts),
            "SPECIFIC_PRODUCTS" => Ok(ApplicableTo::SpecificProducts),
            "SPECIFIC_CATEGORIES" => Ok(ApplicableTo::SpecificCategories),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "applicableTo".to_string(),
                allowed: ApplicableTo::allowed(),
            }),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A named, time-windowed, store-scoped rule that reduces a sale's total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the manager and on receipts.
    pub name: String,

    /// Code typed at checkout. Unique within `store_id`.
    pub code: String,

    pub description: Option<String>,

    pub discount_type: DiscountType,

    /// Basis points for `Percentage`, cents for `FixedAmount`.
    pub value: i64,

    /// Subtotal (cents) a sale must reach before the discount applies.
    pub min_purchase_cents: Option<i64>,

    pub applicable_to: ApplicableTo,

    /// Product ids, used when `applicable_to` is `SpecificProducts`.
    pub products: Vec<String>,

    /// Category ids, used when `applicable_to` is `SpecificCategories`.
    pub categories: Vec<String>,

    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,

    #[ts(as = "String")]
    pub valid_to: DateTime<Utc>,

    /// Manager-controlled switch; independent of the validity window.
    pub is_active: bool,

    /// Owning store. Every query is scoped by it.
    pub store_id: String,

    /// Optional ceiling on `usage_count`.
    pub usage_limit: Option<i64>,

    /// Completed sales this discount was applied to.
    pub usage_count: i64,

    /// Sum of every amount recorded through usage accounting.
    pub total_discount: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Checks whether `now` falls inside `[valid_from, valid_to]` (inclusive).
    #[inline]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }

    /// Checks whether another usage can still be recorded.
    #[inline]
    pub fn has_headroom(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }

    /// Effective state: active, in window, and not exhausted.
    ///
    /// ## Why not a stored status column?
    /// The answer changes with the clock. It is recomputed on every
    /// active listing and before every usage increment instead.
    ///
    /// ```text
    ///   is_active ──┐
    ///   window ─────┼──► usable?
    ///   headroom ───┘
    /// ```
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_within_window(now) && self.has_headroom()
    }

    /// Checks whether the discount covers a given product.
    pub fn applies_to(&self, product_id: &str, category_id: Option<&str>) -> bool {
        match self.applicable_to {
            ApplicableTo::AllProducts => true,
            ApplicableTo::SpecificProducts => self.products.iter().any(|p| p == product_id),
            ApplicableTo::SpecificCategories => category_id
                .map(|c| self.categories.iter().any(|x| x == c))
                .unwrap_or(false),
        }
    }

    /// Amount this discount takes off `subtotal`.
    ///
    /// ## Rules
    /// - Below `min_purchase_cents`: nothing
    /// - Percentage: `value` bps of the subtotal, Bankers Rounding
    /// - Fixed amount: `value` cents, never more than the subtotal
    ///
    /// ## Example
    /// ```rust,ignore
    /// // 10% off $25.00
    /// assert_eq!(discount.discount_for(Money::from_cents(2_500)).cents(), 250);
    /// ```
    pub fn discount_for(&self, subtotal: Money) -> Money {
        if subtotal.is_negative() || subtotal.is_zero() {
            return Money::zero();
        }

        if let Some(min) = self.min_purchase_cents {
            if subtotal.cents() < min {
                return Money::zero();
            }
        }

        let amount = match self.discount_type {
            DiscountType::Percentage => subtotal.percentage(self.value.min(BPS_SCALE)),
            DiscountType::FixedAmount => Money::from_cents(self.value),
        };

        amount.min(subtotal)
    }
}

// =============================================================================
// Caller Context
// =============================================================================

/// Role of the caller, as reported by the access-control collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Cashier,
    /// Any role this service has no special rules for.
    Other(String),
}

impl Role {
    /// Parses a role name. Unknown names are kept as `Other`.
    pub fn parse(raw: &str) -> Role {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Role::SuperAdmin,
            "ADMIN" => Role::Admin,
            "MANAGER" => Role::Manager,
            "CASHIER" => Role::Cashier,
            _ => Role::Other(raw.trim().to_string()),
        }
    }

    /// ADMIN and SUPER_ADMIN may see across stores when not pinned to one.
    #[inline]
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

/// The resolved identity of whoever is calling the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub role: Role,
    /// Home store, if the caller is pinned to one.
    pub store_id: Option<String>,
}

impl CallerContext {
    pub fn new(role: Role, store_id: Option<String>) -> Self {
        CallerContext { role, store_id }
    }

    /// Convenience for a caller pinned to `store_id`.
    pub fn for_store(role: Role, store_id: impl Into<String>) -> Self {
        CallerContext {
            role,
            store_id: Some(store_id.into()),
        }
    }
}

// =============================================================================
// Store Scope
// =============================================================================

/// Which stores a caller may read and mutate.
///
/// ## Resolution
/// ```text
/// ┌──────────────────────┬─────────────────────┬──────────────────────┐
/// │ caller.store_id      │ admin-tier role     │ scope                │
/// ├──────────────────────┼─────────────────────┼──────────────────────┤
/// │ Some(s)              │ any                 │ Store(s)             │
/// │ None                 │ yes                 │ AllStores            │
/// │ None                 │ no                  │ Nothing              │
/// └──────────────────────┴─────────────────────┴──────────────────────┘
/// ```
///
/// Every ledger operation, reads and writes alike, resolves its scope
/// through [`StoreScope::for_caller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreScope {
    /// Only discounts owned by this store.
    Store(String),
    /// Every store.
    AllStores,
    /// No store at all; lookups behave as if nothing exists.
    Nothing,
}

impl StoreScope {
    pub fn for_caller(caller: &CallerContext) -> StoreScope {
        match (&caller.store_id, caller.role.is_admin_tier()) {
            (Some(store_id), _) => StoreScope::Store(store_id.clone()),
            (None, true) => StoreScope::AllStores,
            (None, false) => StoreScope::Nothing,
        }
    }

    /// Checks whether a discount owned by `store_id` is visible.
    pub fn permits(&self, store_id: &str) -> bool {
        match self {
            StoreScope::Store(s) => s == store_id,
            StoreScope::AllStores => true,
            StoreScope::Nothing => false,
        }
    }

    /// Returns `(all_stores, store_id)` for binding into a
    /// `(?all OR store_id = ?store)` SQL clause.
    pub fn as_sql_params(&self) -> (bool, Option<&str>) {
        match self {
            StoreScope::Store(s) => (false, Some(s.as_str())),
            StoreScope::AllStores => (true, None),
            StoreScope::Nothing => (false, None),
        }
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// One page of a listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Builds a page request, clamping `page` to ≥ 1 and `limit` to
    /// `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Rows to skip.
    #[inline]
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// Filter accepted by the `list` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountFilter {
    pub is_active: Option<bool>,
    pub discount_type: Option<DiscountType>,
    pub page: PageRequest,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(discount_type: DiscountType, value: i64) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d1".to_string(),
            name: "Summer".to_string(),
            code: "SUMMER".to_string(),
            description: None,
            discount_type,
            value,
            min_purchase_cents: None,
            applicable_to: ApplicableTo::AllProducts,
            products: vec![],
            categories: vec![],
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            is_active: true,
            store_id: "S1".to_string(),
            usage_limit: None,
            usage_count: 0,
            total_discount: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_window_is_inclusive() {
        let d = discount(DiscountType::Percentage, 1_000);
        assert!(d.is_within_window(d.valid_from));
        assert!(d.is_within_window(d.valid_to));
        assert!(!d.is_within_window(d.valid_to + Duration::seconds(1)));
        assert!(!d.is_within_window(d.valid_from - Duration::seconds(1)));
    }

    #[test]
    fn test_usable_requires_all_three() {
        let now = Utc::now();
        let mut d = discount(DiscountType::Percentage, 1_000);
        assert!(d.is_usable_at(now));

        d.is_active = false;
        assert!(!d.is_usable_at(now));

        d.is_active = true;
        d.usage_limit = Some(2);
        d.usage_count = 2;
        assert!(!d.is_usable_at(now));

        d.usage_count = 1;
        assert!(d.is_usable_at(now));
        assert!(!d.is_usable_at(now + Duration::days(2)));
    }

    #[test]
    fn test_percentage_discount_amount() {
        let d = discount(DiscountType::Percentage, 1_000);
        assert_eq!(d.discount_for(Money::from_cents(2_500)).cents(), 250);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let d = discount(DiscountType::FixedAmount, 500);
        assert_eq!(d.discount_for(Money::from_cents(2_000)).cents(), 500);
        assert_eq!(d.discount_for(Money::from_cents(300)).cents(), 300);
        assert_eq!(d.discount_for(Money::zero()).cents(), 0);
    }

    #[test]
    fn test_min_purchase_gate() {
        let mut d = discount(DiscountType::FixedAmount, 500);
        d.min_purchase_cents = Some(5_000);
        assert!(d.discount_for(Money::from_cents(4_999)).is_zero());
        assert_eq!(d.discount_for(Money::from_cents(5_000)).cents(), 500);
    }

    #[test]
    fn test_applies_to() {
        let mut d = discount(DiscountType::Percentage, 1_000);
        assert!(d.applies_to("p1", None));

        d.applicable_to = ApplicableTo::SpecificProducts;
        d.products = vec!["p1".to_string()];
        assert!(d.applies_to("p1", None));
        assert!(!d.applies_to("p2", None));

        d.applicable_to = ApplicableTo::SpecificCategories;
        d.categories = vec!["drinks".to_string()];
        assert!(d.applies_to("p2", Some("drinks")));
        assert!(!d.applies_to("p2", Some("snacks")));
        assert!(!d.applies_to("p2", None));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("SUPER_ADMIN"), Role::SuperAdmin);
        assert_eq!(Role::parse("Manager"), Role::Manager);
        assert_eq!(Role::parse("AUDITOR"), Role::Other("AUDITOR".to_string()));
        assert!(Role::Admin.is_admin_tier());
        assert!(!Role::Manager.is_admin_tier());
    }

    #[test]
    fn test_store_scope_resolution() {
        let pinned = CallerContext::for_store(Role::Manager, "S1");
        assert_eq!(StoreScope::for_caller(&pinned), StoreScope::Store("S1".into()));

        let pinned_admin = CallerContext::for_store(Role::Admin, "S2");
        assert_eq!(
            StoreScope::for_caller(&pinned_admin),
            StoreScope::Store("S2".into())
        );

        let roaming_admin = CallerContext::new(Role::SuperAdmin, None);
        assert_eq!(StoreScope::for_caller(&roaming_admin), StoreScope::AllStores);

        let storeless = CallerContext::new(Role::Cashier, None);
        assert_eq!(StoreScope::for_caller(&storeless), StoreScope::Nothing);
    }

    #[test]
    fn test_store_scope_permits() {
        assert!(StoreScope::Store("S1".into()).permits("S1"));
        assert!(!StoreScope::Store("S1".into()).permits("S2"));
        assert!(StoreScope::AllStores.permits("S2"));
        assert!(!StoreScope::Nothing.permits("S1"));
    }

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(Some(0), Some(10_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);

        assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_discount_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&DiscountType::FixedAmount).unwrap(),
            "\"FIXED_AMOUNT\""
        );
        assert_eq!("PERCENTAGE".parse::<DiscountType>().unwrap(), DiscountType::Percentage);
        assert!("BOGO".parse::<DiscountType>().is_err());
    }
}
