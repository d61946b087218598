//! # Repository Module
//!
//! Database repository implementations for the discount ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  DiscountLedger                                                        │
//! │       │                                                                 │
//! │       │  repo.increment_usage(&scope, id, amount, now)                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  DiscountRepository                                                    │
//! │  ├── list / list_active (&self, scope, ...)                            │
//! │  ├── get_by_id / get_by_code (&self, scope, key)                       │
//! │  ├── insert / update_fields / toggle_active / delete                   │
//! │  └── increment_usage (one guarded UPDATE)                              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  The repository never decides who may see what: it is handed a        │
//! │  StoreScope and applies it to every statement.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DiscountRepository`](discount::DiscountRepository) - Discount CRUD and usage accounting

pub mod discount;
