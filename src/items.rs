//! Cart line items

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{AmountError, Rupiah, times};

/// Identifier of a cart line (the backend's cart row id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when adjusting a line quantity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// The requested quantity is above the reported stock.
    #[error("only {stock} of item {item} in stock, cannot raise quantity to {requested}")]
    OutOfStock {
        /// Line being adjusted
        item: ItemId,

        /// Quantity that was asked for
        requested: u32,

        /// Stock reported by the backend
        stock: u32,
    },
}

/// Outcome of lowering a line quantity by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line keeps this new quantity.
    Set(u32),

    /// The line would reach zero and must be removed instead.
    Remove,
}

/// A single line in the member's cart, mirrored from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    /// Cart row id
    pub id: ItemId,

    /// Product in this line
    pub product_id: ProductId,

    /// Product display name
    pub name: String,

    /// Price of a single unit
    pub unit_price: Rupiah,

    /// Units in the cart
    pub quantity: u32,

    /// Weight of a single unit in grams
    pub unit_weight_grams: u32,

    /// Business value earned per unit
    pub unit_bv: Decimal,

    /// Units the backend reports as available
    pub stock: u32,

    /// Selected product variant, if any
    pub variant: Option<String>,
}

impl CartLineItem {
    /// Price of the whole line (unit price times quantity).
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the line price overflows.
    pub fn line_price(&self) -> Result<Rupiah, AmountError> {
        times(&self.unit_price, self.quantity)
    }

    /// Weight of the whole line in grams.
    pub fn line_weight_grams(&self) -> u64 {
        u64::from(self.unit_weight_grams) * u64::from(self.quantity)
    }

    /// Business value of the whole line.
    pub fn line_bv(&self) -> Decimal {
        self.unit_bv * Decimal::from(self.quantity)
    }

    /// Whether the line asks for more units than are in stock.
    pub fn exceeds_stock(&self) -> bool {
        self.quantity > self.stock
    }

    /// Quantity after adding one unit.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfStock`] if one more unit would exceed stock.
    pub fn increased_quantity(&self) -> Result<u32, QuantityError> {
        let requested = self.quantity.saturating_add(1);

        if requested > self.stock {
            return Err(QuantityError::OutOfStock {
                item: self.id,
                requested,
                stock: self.stock,
            });
        }

        Ok(requested)
    }

    /// Quantity after removing one unit. A line never drops below one unit.
    pub fn decreased_quantity(&self) -> QuantityChange {
        if self.quantity <= 1 {
            QuantityChange::Remove
        } else {
            QuantityChange::Set(self.quantity - 1)
        }
    }
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::money::whole_rupiah;

    use super::{test_support::line, *};

    #[test]
    fn line_totals_scale_with_quantity() -> TestResult {
        let item = line(1, 50_000, 2, 40, 10);

        assert_eq!(whole_rupiah(&item.line_price()?), 100_000);
        assert_eq!(item.line_weight_grams(), 500);
        assert_eq!(item.line_bv(), Decimal::from(80));

        Ok(())
    }

    #[test]
    fn increase_is_capped_by_stock() {
        let item = line(1, 1_000, 3, 1, 3);

        assert_eq!(
            item.increased_quantity(),
            Err(QuantityError::OutOfStock {
                item: ItemId(1),
                requested: 4,
                stock: 3,
            })
        );
    }

    #[test]
    fn increase_below_stock_adds_one() {
        let item = line(1, 1_000, 2, 1, 3);

        assert_eq!(item.increased_quantity(), Ok(3));
    }

    #[test]
    fn decrease_at_one_requires_removal() {
        assert_eq!(
            line(1, 1_000, 1, 1, 3).decreased_quantity(),
            QuantityChange::Remove
        );
        assert_eq!(
            line(1, 1_000, 2, 1, 3).decreased_quantity(),
            QuantityChange::Set(1)
        );
    }

    #[test]
    fn exceeds_stock_compares_quantity_to_stock() {
        assert!(line(1, 1_000, 6, 1, 5).exceeds_stock());
        assert!(!line(1, 1_000, 5, 1, 5).exceeds_stock());
    }
}
