//! # ledger-core: Pure Business Logic for the Discount Ledger
//!
//! This crate is the **heart** of the discount ledger. It contains the
//! discount rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Discount Ledger Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Checkout / Back-office (external callers)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ledger-api (axum routes)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ledger-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   input   │  │ validation│  │   │
//! │  │   │ Discount  │  │   Money   │  │  Create…  │  │   rules   │  │   │
//! │  │   │StoreScope │  │ bps math  │  │  Update…  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ledger-db (Database + Ledger service)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Discount, caller context, store scope, paging
//! - [`money`] - Money type with integer arithmetic
//! - [`input`] - Typed create/update/usage payloads
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use ledger_core::{CallerContext, Role, StoreScope};
//!
//! let caller = CallerContext::for_store(Role::Manager, "S1");
//! let scope = StoreScope::for_caller(&caller);
//!
//! assert!(scope.permits("S1"));
//! assert!(!scope.permits("S2"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use input::{CreateDiscountInput, IncrementUsageInput, UpdateDiscountInput};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page a listing will return.
///
/// ## Business Reason
/// A store with years of promotions can hold thousands of discounts;
/// listings never return them unbounded.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Maximum length of a discount code.
pub const MAX_CODE_LENGTH: usize = 50;

/// Maximum length of a discount name.
pub const MAX_NAME_LENGTH: usize = 200;
