//! # Money Module
//!
//! Provides the `Money` type used for discount amounts and the ledger's
//! running `total_discount` accumulator.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Accumulating float amounts drifts:                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A discount total summed over 100,000 sales must match the sum of the  │
//! │  receipts to the cent.                                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    total_discount_cents = total_discount_cents + amount_cents          │
//! │    (done in SQL, in the same statement as the usage increment)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ledger_core::money::Money;
//!
//! let subtotal = Money::from_cents(2_500); // $25.00
//! let off = subtotal.percentage(1_000);    // 10% → $2.50
//! assert_eq!(off.cents(), 250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

/// Basis points in 1%.
pub const BPS_PER_PERCENT: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Same width as the SQLite INTEGER column
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Newtype serde**: Serialized as a bare integer of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use ledger_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` on overflow.
    ///
    /// The ledger accumulator must never wrap; callers reject the
    /// operation instead.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Computes `bps` basis points of this amount with Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKERS ROUNDING (Round Half to Even)                              │
    /// │                                                                     │
    /// │  0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)        │
    /// │                                                                     │
    /// │  Over millions of discounted sales this keeps the accumulated      │
    /// │  discount total from drifting in the customer's or store's favor.  │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use ledger_core::money::Money;
    ///
    /// // 15% of $0.50 = 7.5 cents → 8 (8 is even)
    /// assert_eq!(Money::from_cents(50).percentage(1_500).cents(), 8);
    /// // 5% of $0.50 = 2.5 cents → 2 (2 is even)
    /// assert_eq!(Money::from_cents(50).percentage(500).cents(), 2);
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        // i128 so large subtotals times 10_000 cannot overflow
        let numerator = self.0 as i128 * bps as i128;
        let scale = BPS_SCALE as i128;
        let quotient = numerator.div_euclid(scale);
        let remainder = numerator.rem_euclid(scale);

        let rounded = match (remainder * 2).cmp(&scale) {
            std::cmp::Ordering::Less => quotient,
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal if quotient % 2 == 0 => quotient,
            std::cmp::Ordering::Equal => quotient + 1,
        };

        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as dollars for logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_accumulation() {
        let mut total = Money::zero();
        total += Money::from_cents(50);
        total += Money::from_cents(25);
        assert_eq!(total.cents(), 75);
        assert_eq!((total - Money::from_cents(25)).cents(), 50);
    }

    #[test]
    fn test_checked_add_overflow() {
        let big = Money::from_cents(i64::MAX);
        assert!(big.checked_add(Money::from_cents(1)).is_none());
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_percentage_basic() {
        let subtotal = Money::from_cents(10_000); // $100.00
        assert_eq!(subtotal.percentage(1_000).cents(), 1_000); // 10%
        assert_eq!(subtotal.percentage(BPS_SCALE).cents(), 10_000); // 100%
        assert_eq!(subtotal.percentage(0).cents(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_to_even() {
        // 2.5 → 2, 7.5 → 8
        assert_eq!(Money::from_cents(50).percentage(500).cents(), 2);
        assert_eq!(Money::from_cents(50).percentage(1_500).cents(), 8);
        // 8.25% of $10.00 = 82.5 cents → 82
        assert_eq!(Money::from_cents(1_000).percentage(825).cents(), 82);
        // Not a tie: 0.6 → 1
        assert_eq!(Money::from_cents(6).percentage(1_000).cents(), 1);
    }

    #[test]
    fn test_serializes_as_bare_cents() {
        let json = serde_json::to_string(&Money::from_cents(75)).unwrap();
        assert_eq!(json, "75");
    }
}
