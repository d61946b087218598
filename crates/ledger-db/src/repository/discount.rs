//! # Discount Repository
//!
//! Database operations for discounts.
//!
//! ## Key Operations
//! - Store-scoped reads (list, active listing, by id, by code)
//! - Insert, field update, toggle, delete
//! - Atomic usage increment
//!
//! ## Store Scope in SQL
//! Every scoped statement carries the same clause, bound from
//! [`StoreScope::as_sql_params`]:
//! ```text
//!   WHERE (?all OR store_id = ?store)
//!
//!   Store("S1") → (0 OR store_id = 'S1')   only S1
//!   AllStores   → (1 OR ...)               every row
//!   Nothing     → (0 OR store_id = NULL)   no row (NULL is never equal)
//! ```
//!
//! ## Atomic Usage Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two checkouts race for the last use of a code (limit 1, count 0)      │
//! │                                                                         │
//! │  Read-then-write (WRONG):           Guarded UPDATE (what we do):        │
//! │    A reads count=0 ✓                  A: UPDATE ... WHERE count < limit │
//! │    B reads count=0 ✓                     → 1 row, count=1               │
//! │    A writes count=1                   B: UPDATE ... WHERE count < limit │
//! │    B writes count=2  ❌ overshoot        → 0 rows, rejected             │
//! │                                                                         │
//! │  The check and both counters move in ONE statement. SQLite serializes  │
//! │  writers, so the guard always sees the latest committed count.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use ledger_core::{
    ApplicableTo, Discount, DiscountFilter, DiscountType, Money, PageRequest, StoreScope,
};

/// Column list shared by every SELECT and RETURNING clause.
const COLUMNS: &str = "id, store_id, name, code, description, discount_type, value, \
     min_purchase_cents, applicable_to, products, categories, valid_from, valid_to, \
     is_active, usage_limit, usage_count, total_discount_cents, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// A `discounts` row as stored.
///
/// Differs from [`Discount`] where SQLite needs a plainer shape:
/// id lists are JSON text and the accumulator is raw cents.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    store_id: String,
    name: String,
    code: String,
    description: Option<String>,
    discount_type: DiscountType,
    value: i64,
    min_purchase_cents: Option<i64>,
    applicable_to: ApplicableTo,
    products: String,
    categories: String,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    is_active: bool,
    usage_limit: Option<i64>,
    usage_count: i64,
    total_discount_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DbError;

    fn try_from(row: DiscountRow) -> DbResult<Self> {
        let products = decode_ids(&row.id, "products", &row.products)?;
        let categories = decode_ids(&row.id, "categories", &row.categories)?;

        Ok(Discount {
            id: row.id,
            name: row.name,
            code: row.code,
            description: row.description,
            discount_type: row.discount_type,
            value: row.value,
            min_purchase_cents: row.min_purchase_cents,
            applicable_to: row.applicable_to,
            products,
            categories,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            is_active: row.is_active,
            store_id: row.store_id,
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            total_discount: Money::from_cents(row.total_discount_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_ids(id: &str, column: &str, raw: &str) -> DbResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| DbError::Decode {
        id: id.to_string(),
        reason: format!("{}: {}", column, e),
    })
}

fn encode_ids(ids: &[String]) -> DbResult<String> {
    serde_json::to_string(ids).map_err(|e| DbError::Internal(e.to_string()))
}

fn into_discounts(rows: Vec<DiscountRow>) -> DbResult<Vec<Discount>> {
    rows.into_iter().map(Discount::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount database operations.
///
/// Methods take a [`StoreScope`] rather than a caller; deciding the
/// scope is the ledger's job.
///
/// ## Usage
/// ```rust,ignore
/// let repo = DiscountRepository::new(pool);
///
/// let scope = StoreScope::Store("S1".to_string());
/// let discount = repo.get_by_id(&scope, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists discounts, newest first.
    ///
    /// `rowid` breaks ties between rows created in the same instant so
    /// repeated reads return the same order.
    pub async fn list(
        &self,
        scope: &StoreScope,
        filter: &DiscountFilter,
    ) -> DbResult<Vec<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(
            ?scope,
            is_active = ?filter.is_active,
            discount_type = ?filter.discount_type,
            page = filter.page.page,
            limit = filter.page.limit,
            "Listing discounts"
        );

        let sql = format!(
            r#"
            SELECT {}
            FROM discounts
            WHERE (?1 OR store_id = ?2)
              AND (?3 IS NULL OR is_active = ?3)
              AND (?4 IS NULL OR discount_type = ?4)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?5 OFFSET ?6
            "#,
            COLUMNS
        );

        let rows = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(all_stores)
            .bind(store_id)
            .bind(filter.is_active)
            .bind(filter.discount_type)
            .bind(i64::from(filter.page.limit))
            .bind(i64::from(filter.page.offset()))
            .fetch_all(&self.pool)
            .await?;

        let discounts = into_discounts(rows)?;
        debug!(count = discounts.len(), "List returned discounts");
        Ok(discounts)
    }

    /// Lists discounts that are flagged active and whose window contains `now`.
    ///
    /// Timestamps are stored as RFC 3339 UTC text, so the window check
    /// compares strings.
    pub async fn list_active(
        &self,
        scope: &StoreScope,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> DbResult<Vec<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(?scope, %now, page = page.page, limit = page.limit, "Listing active discounts");

        let sql = format!(
            r#"
            SELECT {}
            FROM discounts
            WHERE (?1 OR store_id = ?2)
              AND is_active = 1
              AND valid_from <= ?3
              AND valid_to >= ?3
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?4 OFFSET ?5
            "#,
            COLUMNS
        );

        let rows = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(all_stores)
            .bind(store_id)
            .bind(now)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;

        into_discounts(rows)
    }

    /// Gets a discount by id within `scope`.
    ///
    /// ## Returns
    /// * `Ok(Some(discount))` - Discount found and visible
    /// * `Ok(None)` - Absent, or owned by a store outside the scope
    pub async fn get_by_id(&self, scope: &StoreScope, id: &str) -> DbResult<Option<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(id = %id, ?scope, "Getting discount by ID");

        let sql = format!(
            "SELECT {} FROM discounts WHERE id = ?1 AND (?2 OR store_id = ?3)",
            COLUMNS
        );

        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(id)
            .bind(all_stores)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Gets a discount by code within `scope`.
    ///
    /// Codes are unique per store, so across several stores the oldest
    /// match wins.
    pub async fn get_by_code(&self, scope: &StoreScope, code: &str) -> DbResult<Option<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(code = %code, ?scope, "Getting discount by code");

        let sql = format!(
            r#"
            SELECT {}
            FROM discounts
            WHERE code = ?1 AND (?2 OR store_id = ?3)
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(code)
            .bind(all_stores)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Inserts a new discount.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - code already used in this store
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, code = %discount.code, store_id = %discount.store_id, "Inserting discount");

        let products = encode_ids(&discount.products)?;
        let categories = encode_ids(&discount.categories)?;

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, store_id, name, code, description, discount_type, value,
                min_purchase_cents, applicable_to, products, categories,
                valid_from, valid_to, is_active, usage_limit, usage_count,
                total_discount_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.store_id)
        .bind(&discount.name)
        .bind(&discount.code)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.min_purchase_cents)
        .bind(discount.applicable_to)
        .bind(products)
        .bind(categories)
        .bind(discount.valid_from)
        .bind(discount.valid_to)
        .bind(discount.is_active)
        .bind(discount.usage_limit)
        .bind(discount.usage_count)
        .bind(discount.total_discount.cents())
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes the editable fields of `discount` back, within `scope`.
    ///
    /// `usage_count`, `total_discount_cents` and `store_id` are never
    /// written here, so an update cannot undo a concurrent increment.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - nothing matched the id within scope
    /// * `DbError::CheckViolation` - `usage_limit` would fall below a
    ///   count that moved since the caller read it
    pub async fn update_fields(&self, scope: &StoreScope, discount: &Discount) -> DbResult<Discount> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(id = %discount.id, ?scope, "Updating discount");

        let products = encode_ids(&discount.products)?;
        let categories = encode_ids(&discount.categories)?;

        let sql = format!(
            r#"
            UPDATE discounts SET
                name = ?1,
                code = ?2,
                description = ?3,
                discount_type = ?4,
                value = ?5,
                min_purchase_cents = ?6,
                applicable_to = ?7,
                products = ?8,
                categories = ?9,
                valid_from = ?10,
                valid_to = ?11,
                is_active = ?12,
                usage_limit = ?13,
                updated_at = ?14
            WHERE id = ?15 AND (?16 OR store_id = ?17)
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(&discount.name)
            .bind(&discount.code)
            .bind(&discount.description)
            .bind(discount.discount_type)
            .bind(discount.value)
            .bind(discount.min_purchase_cents)
            .bind(discount.applicable_to)
            .bind(products)
            .bind(categories)
            .bind(discount.valid_from)
            .bind(discount.valid_to)
            .bind(discount.is_active)
            .bind(discount.usage_limit)
            .bind(discount.updated_at)
            .bind(&discount.id)
            .bind(all_stores)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Discount::try_from(row),
            None => Err(DbError::not_found("Discount", &discount.id)),
        }
    }

    /// Flips `is_active` in one statement.
    pub async fn toggle_active(
        &self,
        scope: &StoreScope,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(id = %id, ?scope, "Toggling discount");

        let sql = format!(
            r#"
            UPDATE discounts
            SET is_active = NOT is_active, updated_at = ?1
            WHERE id = ?2 AND (?3 OR store_id = ?4)
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(now)
            .bind(id)
            .bind(all_stores)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Deletes a discount within `scope`.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - nothing matched the id within scope
    pub async fn delete(&self, scope: &StoreScope, id: &str) -> DbResult<()> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(id = %id, ?scope, "Deleting discount");

        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1 AND (?2 OR store_id = ?3)")
            .bind(id)
            .bind(all_stores)
            .bind(store_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    /// Records one usage of a discount and adds `amount` to its total.
    ///
    /// ## How It Works
    /// One guarded `UPDATE ... RETURNING`:
    /// - the row must be in scope
    /// - `usage_limit` must be unset or above `usage_count`
    /// - the accumulator must have room for `amount`
    ///
    /// ## Returns
    /// * `Ok(Some(discount))` - the row after the increment
    /// * `Ok(None)` - no row updated; nothing changed. The caller reads
    ///   the row again to tell "absent" from "exhausted".
    pub async fn increment_usage(
        &self,
        scope: &StoreScope,
        id: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Discount>> {
        let (all_stores, store_id) = scope.as_sql_params();

        debug!(id = %id, ?scope, amount = amount.cents(), "Incrementing discount usage");

        let sql = format!(
            r#"
            UPDATE discounts
            SET usage_count = usage_count + 1,
                total_discount_cents = total_discount_cents + ?1,
                updated_at = ?2
            WHERE id = ?3
              AND (?4 OR store_id = ?5)
              AND (usage_limit IS NULL OR usage_count < usage_limit)
              AND total_discount_cents <= ?6
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(amount.cents())
            .bind(now)
            .bind(id)
            .bind(all_stores)
            .bind(store_id)
            .bind(i64::MAX.saturating_sub(amount.cents()))
            .fetch_optional(&self.pool)
            .await?;

        row.map(Discount::try_from).transpose()
    }
}
