//! Money
//!
//! The storefront trades in Indonesian Rupiah. The backend sends whole-rupiah integers,
//! while [`rusty_money`] stores amounts in ISO minor units, so every conversion between
//! the two goes through this module.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// Currency used for every amount in the storefront.
pub const CURRENCY: &Currency = iso::IDR;

/// A rupiah amount.
pub type Rupiah = Money<'static, Currency>;

/// Errors converting between whole rupiah and money values.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// The amount cannot be represented in minor units.
    #[error("amount of {0} rupiah overflows the minor unit range")]
    Overflow(i64),

    /// A decimal amount could not be represented as whole rupiah.
    #[error("amount {0} cannot be represented as whole rupiah")]
    NotRepresentable(Decimal),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

fn minor_per_rupiah() -> i64 {
    10_i64.pow(u32::from(CURRENCY.exponent))
}

/// Create a money value from a whole-rupiah amount.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the amount does not fit in minor units.
pub fn rupiah(amount: i64) -> Result<Rupiah, AmountError> {
    let minor = amount
        .checked_mul(minor_per_rupiah())
        .ok_or(AmountError::Overflow(amount))?;

    Ok(Money::from_minor(minor, CURRENCY))
}

/// Zero rupiah.
pub fn zero() -> Rupiah {
    Money::from_minor(0, CURRENCY)
}

/// Whole-rupiah value of a money amount, truncating any sub-rupiah remainder.
pub fn whole_rupiah(money: &Rupiah) -> i64 {
    money.to_minor_units() / minor_per_rupiah()
}

/// Whole-rupiah value of a money amount as a decimal.
pub fn as_decimal(money: &Rupiah) -> Decimal {
    Decimal::from(whole_rupiah(money))
}

/// Round a decimal rupiah amount to whole rupiah, half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::NotRepresentable`] if the rounded value does not fit in an `i64`,
/// or [`AmountError::Overflow`] if it does not fit in minor units.
pub fn round_to_rupiah(amount: Decimal) -> Result<Rupiah, AmountError> {
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::NotRepresentable(amount))?;

    rupiah(whole)
}

/// Multiply a money amount by a quantity.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the product does not fit in minor units.
pub fn times(money: &Rupiah, quantity: u32) -> Result<Rupiah, AmountError> {
    let minor = money
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AmountError::Overflow(whole_rupiah(money)))?;

    Ok(Money::from_minor(minor, money.currency()))
}
