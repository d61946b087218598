//! # Discount Ledger
//!
//! The service every caller goes through: resolves the caller's store
//! scope, validates inputs, and drives the repository.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller ──► StoreScope::for_caller ──► validate input ──► repository   │
//! │                                                              │          │
//! │                        LedgerError ◄── DbError / CoreError ◄─┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service keeps no state of its own between calls. The database is
//! the only shared state.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::discount::DiscountRepository;
use ledger_core::validation::{validate_discount, validate_uuid};
use ledger_core::{
    CallerContext, CoreError, CreateDiscountInput, Discount, DiscountFilter, IncrementUsageInput,
    PageRequest, StoreScope, UpdateDiscountInput,
};

/// Discount ledger service.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
/// let caller = CallerContext::for_store(Role::Cashier, "S1");
///
/// let discount = ledger.get_by_code("SUMMER10", &caller).await?;
/// let input = IncrementUsageInput::new(discount.discount_for(subtotal));
/// ledger.increment_usage(&discount.id, input, &caller).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscountLedger {
    discounts: DiscountRepository,
}

impl DiscountLedger {
    pub fn new(discounts: DiscountRepository) -> Self {
        DiscountLedger { discounts }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists discounts visible to `caller`, newest first.
    pub async fn list(
        &self,
        filter: &DiscountFilter,
        caller: &CallerContext,
    ) -> LedgerResult<Vec<Discount>> {
        let scope = StoreScope::for_caller(caller);
        Ok(self.discounts.list(&scope, filter).await?)
    }

    /// Lists discounts that are active right now.
    pub async fn list_active(
        &self,
        caller: &CallerContext,
        page: PageRequest,
    ) -> LedgerResult<Vec<Discount>> {
        self.list_active_at(caller, page, Utc::now()).await
    }

    /// Lists discounts flagged active whose window contains `now`.
    pub async fn list_active_at(
        &self,
        caller: &CallerContext,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<Discount>> {
        let scope = StoreScope::for_caller(caller);
        Ok(self.discounts.list_active(&scope, now, page).await?)
    }

    /// Gets a discount by id.
    ///
    /// ## Errors
    /// * `LedgerError::NotFound` - absent, or owned by another store
    pub async fn get_by_id(&self, id: &str, caller: &CallerContext) -> LedgerResult<Discount> {
        let scope = StoreScope::for_caller(caller);
        self.discounts
            .get_by_id(&scope, id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Gets a discount by the code a cashier typed.
    pub async fn get_by_code(&self, code: &str, caller: &CallerContext) -> LedgerResult<Discount> {
        let scope = StoreScope::for_caller(caller);
        self.discounts
            .get_by_code(&scope, code.trim())
            .await?
            .ok_or_else(|| LedgerError::NotFound(code.to_string()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a discount.
    ///
    /// The owner store is the caller's store when it has one, otherwise
    /// `input.store_id`.
    ///
    /// ## Errors
    /// * `LedgerError::BadRequest` - no store could be resolved
    /// * `LedgerError::Validation` - field rules failed
    /// * `LedgerError::Conflict` - code already used in that store
    pub async fn create(
        &self,
        input: CreateDiscountInput,
        caller: &CallerContext,
    ) -> LedgerResult<Discount> {
        let store_id = resolve_store(caller, input.store_id.as_deref())
            .ok_or(CoreError::StoreRequired)?;

        input.validate()?;

        let discount = input.into_discount(Uuid::new_v4().to_string(), store_id, Utc::now())?;
        self.discounts.insert(&discount).await?;

        info!(
            id = %discount.id,
            code = %discount.code,
            store_id = %discount.store_id,
            "Discount created"
        );
        Ok(discount)
    }

    /// Applies a partial update.
    ///
    /// Rules are re-checked against the merged record, so a type change
    /// or a one-sided window edit is judged on the final values.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateDiscountInput,
        caller: &CallerContext,
    ) -> LedgerResult<Discount> {
        validate_uuid(id).map_err(CoreError::from)?;

        let scope = StoreScope::for_caller(caller);
        let mut discount = self
            .discounts
            .get_by_id(&scope, id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        if input.is_empty() {
            debug!(id = %id, "Empty update; returning current record");
            return Ok(discount);
        }

        input.apply(&mut discount).map_err(CoreError::from)?;
        discount.updated_at = Utc::now();
        validate_discount(&discount)?;

        let updated = self
            .discounts
            .update_fields(&scope, &discount)
            .await
            .map_err(|e| match e {
                DbError::CheckViolation { .. } => LedgerError::Conflict(
                    "Discount usage changed during update; retry".to_string(),
                ),
                other => LedgerError::from(other),
            })?;

        info!(id = %updated.id, code = %updated.code, "Discount updated");
        Ok(updated)
    }

    /// Flips the active flag.
    pub async fn toggle_active(&self, id: &str, caller: &CallerContext) -> LedgerResult<Discount> {
        let scope = StoreScope::for_caller(caller);
        let discount = self
            .discounts
            .toggle_active(&scope, id, Utc::now())
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        info!(id = %discount.id, is_active = discount.is_active, "Discount toggled");
        Ok(discount)
    }

    /// Deletes a discount. Usage history goes with it.
    pub async fn delete(&self, id: &str, caller: &CallerContext) -> LedgerResult<()> {
        let scope = StoreScope::for_caller(caller);
        self.discounts.delete(&scope, id).await?;

        info!(id = %id, "Discount deleted");
        Ok(())
    }

    /// Records one completed sale against a discount.
    ///
    /// ## How It Works
    /// ```text
    /// 1. validate amount (≥ 0)
    /// 2. guarded UPDATE: count+1, total+amount, only if headroom remains
    /// 3. no row updated? read once to say why:
    ///      not visible      → NotFound
    ///      no headroom      → BadRequest (usage limit reached)
    ///      total would wrap → BadRequest
    /// ```
    ///
    /// A rejected call changes neither counter.
    pub async fn increment_usage(
        &self,
        id: &str,
        input: IncrementUsageInput,
        caller: &CallerContext,
    ) -> LedgerResult<Discount> {
        input.validate()?;

        let scope = StoreScope::for_caller(caller);

        if let Some(discount) = self
            .discounts
            .increment_usage(&scope, id, input.amount, Utc::now())
            .await?
        {
            debug!(
                id = %discount.id,
                usage_count = discount.usage_count,
                total_discount = %discount.total_discount,
                "Discount usage recorded"
            );
            return Ok(discount);
        }

        let current = self
            .discounts
            .get_by_id(&scope, id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        if !current.has_headroom() {
            let limit = current.usage_limit.unwrap_or(current.usage_count);
            warn!(
                id = %current.id,
                code = %current.code,
                limit,
                "Usage rejected: limit reached"
            );
            return Err(CoreError::UsageLimitReached {
                code: current.code,
                limit,
            }
            .into());
        }

        if current.total_discount.checked_add(input.amount).is_none() {
            warn!(id = %current.id, "Usage rejected: total would overflow");
            return Err(LedgerError::BadRequest(
                "Discount total would overflow".to_string(),
            ));
        }

        // The limit was raised between the UPDATE and the read.
        Err(LedgerError::Conflict(
            "Discount changed during usage update; retry".to_string(),
        ))
    }
}

/// Picks the owner store for a new discount. Blank ids count as absent.
fn resolve_store(caller: &CallerContext, requested: Option<&str>) -> Option<String> {
    caller
        .store_id
        .as_deref()
        .or(requested)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::Role;

    #[test]
    fn test_resolve_store_prefers_caller() {
        let pinned = CallerContext::for_store(Role::Manager, "S1");
        assert_eq!(resolve_store(&pinned, Some("S2")), Some("S1".to_string()));

        let admin = CallerContext::new(Role::Admin, None);
        assert_eq!(resolve_store(&admin, Some("S2")), Some("S2".to_string()));
        assert_eq!(resolve_store(&admin, None), None);
        assert_eq!(resolve_store(&admin, Some("  ")), None);
    }
}
