//! # ledger-db: Storage and Ledger Service for the Discount Ledger
//!
//! This crate provides database access and the discount ledger service.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Discount Ledger Data Flow                           │
//! │                                                                         │
//! │  HTTP handler (POST /discounts/{id}/usage)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    ledger-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ DiscountLedger│    │  Repository   │    │  Migrations  │  │   │
//! │  │   │  (ledger.rs)  │───►│ (discount.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ scope + rules │    │ scoped SQL    │    │ 001_create_  │  │   │
//! │  │   │ error mapping │    │ atomic usage  │    │ discounts    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │  Database (pool.rs)           │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Discount repository
//! - [`ledger`] - Store-scoped ledger operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_db::{Database, DbConfig};
//! use ledger_core::{CallerContext, PageRequest, Role};
//!
//! let db = Database::new(DbConfig::new("path/to/ledger.db")).await?;
//!
//! let caller = CallerContext::for_store(Role::Cashier, "S1");
//! let active = db.ledger().list_active(&caller, PageRequest::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::DiscountLedger;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::discount::DiscountRepository;
