//! # ledger-api
//!
//! HTTP surface of the discount ledger.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request ──► Caller (x-user-role, x-store-id)                          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  routes::discounts ──► DTO ──► DiscountLedger ──► SQLite               │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  JSON response, or ApiError { code, message, fields? }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod caller;
pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use ledger_db::{Database, DiscountLedger};

/// Shared application state. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub ledger: DiscountLedger,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let ledger = db.ledger();
        AppState { db, ledger }
    }
}

/// Builds the router for `state`.
pub fn build_router(state: AppState) -> Router {
    routes::router(state)
}
