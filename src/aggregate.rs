//! Cart Aggregation
//!
//! Totals over a set of selected cart lines. Every reduction is order-independent and
//! yields zero for an empty selection.

use rust_decimal::Decimal;
use rusty_money::MoneyError;
use thiserror::Error;

use crate::{
    items::CartLineItem,
    money::{AmountError, Rupiah, zero},
};

const GRAMS_PER_KILOGRAM: u32 = 1_000;

/// Errors that can occur while aggregating cart totals.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// A line price could not be represented.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Sum of unit price times quantity over all lines.
///
/// # Errors
///
/// Returns an [`AggregateError`] if a line price or the running total overflows.
pub fn total_price(items: &[CartLineItem]) -> Result<Rupiah, AggregateError> {
    items.iter().try_fold(zero(), |acc, item| {
        let line = item.line_price()?;

        Ok(acc.add(line)?)
    })
}

/// Sum of unit weight times quantity over all lines, in grams.
pub fn total_weight_grams(items: &[CartLineItem]) -> u64 {
    items.iter().map(CartLineItem::line_weight_grams).sum()
}

/// Sum of unit weight times quantity over all lines, in kilograms.
pub fn total_weight_kg(items: &[CartLineItem]) -> Decimal {
    Decimal::from(total_weight_grams(items)) / Decimal::from(GRAMS_PER_KILOGRAM)
}

/// Sum of unit BV times quantity over all lines.
pub fn total_bv(items: &[CartLineItem]) -> Decimal {
    items.iter().map(CartLineItem::line_bv).sum()
}

/// Sum of quantities over all lines.
pub fn total_item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Snapshot of every aggregate for one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    /// Product subtotal before discounts
    pub price: Rupiah,

    /// Total weight in kilograms
    pub weight_kg: Decimal,

    /// Total business value
    pub bv: Decimal,

    /// Total number of units
    pub item_count: u64,
}

impl CartTotals {
    /// Aggregate the given lines.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] if the price total overflows.
    pub fn of(items: &[CartLineItem]) -> Result<Self, AggregateError> {
        Ok(Self {
            price: total_price(items)?,
            weight_kg: total_weight_kg(items),
            bv: total_bv(items),
            item_count: total_item_count(items),
        })
    }

    /// Totals for an empty selection.
    pub fn empty() -> Self {
        Self {
            price: zero(),
            weight_kg: Decimal::ZERO,
            bv: Decimal::ZERO,
            item_count: 0,
        }
    }
}
