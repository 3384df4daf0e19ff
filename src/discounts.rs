//! Voucher discounts and the settlement amount
//!
//! Voucher discounts apply to the product subtotal only. Shipping is added after the
//! discount and is never reduced by it.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::MoneyError;
use thiserror::Error;

use crate::money::{AmountError, Rupiah, as_decimal, round_to_rupiah};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Discount points were outside `0..=100`.
    #[error("voucher discount must be between 0 and 100 percent, got {0}")]
    OutOfRange(Decimal),

    /// A discounted amount could not be represented.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A voucher that passed backend validation.
#[derive(Debug, Clone)]
pub struct AppliedVoucher {
    /// Code the member entered
    pub code: String,

    /// Discount taken off the product subtotal
    pub discount: Percentage,
}

impl AppliedVoucher {
    /// Create an applied voucher from a discount expressed in percent points (`10` is 10%).
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::OutOfRange`] if the points are outside `0..=100`.
    pub fn from_points(code: impl Into<String>, points: Decimal) -> Result<Self, DiscountError> {
        Ok(Self {
            code: code.into(),
            discount: percentage_from_points(points)?,
        })
    }
}

/// Convert percent points (`10` meaning 10%) into a [`Percentage`].
///
/// # Errors
///
/// Returns [`DiscountError::OutOfRange`] if the points are outside `0..=100`.
pub fn percentage_from_points(points: Decimal) -> Result<Percentage, DiscountError> {
    if points < Decimal::ZERO || points > ONE_HUNDRED {
        return Err(DiscountError::OutOfRange(points));
    }

    Ok(Percentage::from(points / ONE_HUNDRED))
}

fn fraction(percent: &Percentage) -> Decimal {
    // decimal_percentage doesn't expose the underlying Decimal
    (*percent) * Decimal::ONE
}

/// Product subtotal after a percentage discount, rounded to whole rupiah.
///
/// # Errors
///
/// Returns a [`DiscountError`] if the discounted amount cannot be represented.
pub fn discounted_subtotal(
    subtotal: &Rupiah,
    discount: Option<&Percentage>,
) -> Result<Rupiah, DiscountError> {
    let Some(discount) = discount else {
        return Ok(*subtotal);
    };

    let remaining = Decimal::ONE - fraction(discount);

    Ok(round_to_rupiah(as_decimal(subtotal) * remaining)?)
}

/// Amount the member pays: discounted subtotal plus shipping.
///
/// # Errors
///
/// Returns a [`DiscountError`] if the discounted amount cannot be represented or the
/// addition overflows.
pub fn gross_amount(
    subtotal: &Rupiah,
    discount: Option<&Percentage>,
    shipping_cost: &Rupiah,
) -> Result<Rupiah, DiscountError> {
    Ok(discounted_subtotal(subtotal, discount)?.add(*shipping_cost)?)
}
