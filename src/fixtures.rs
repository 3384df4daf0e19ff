//! Fixtures
//!
//! Cart scenarios described in YAML, used by tests and the offline CLI commands.
//!
//! ```yaml
//! items:
//!   - id: 1
//!     name: Kopi Ginseng
//!     price: 50000
//!     quantity: 2
//!     weight: 250
//!     bv: 40
//!     stock: 10
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    checkout::{BvPeriod, CheckoutDraft, MemberProfile, PaymentMethod, PlanId},
    discounts::{AppliedVoucher, DiscountError},
    items::{CartLineItem, ItemId, ProductId},
    money::{AmountError, rupiah},
    shipping::ShippingSelection,
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,

        /// Underlying error
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Invalid voucher
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// A cart line in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct LineFixture {
    /// Cart row id
    pub id: u64,

    /// Product id, defaults to the row id
    #[serde(default)]
    pub product_id: Option<u64>,

    /// Product name
    pub name: String,

    /// Unit price in whole rupiah
    pub price: i64,

    /// Units in the cart
    pub quantity: u32,

    /// Unit weight in grams
    #[serde(default)]
    pub weight: u32,

    /// Unit BV
    #[serde(default)]
    pub bv: Decimal,

    /// Available stock, defaults to the quantity
    #[serde(default)]
    pub stock: Option<u32>,

    /// Product variant
    #[serde(default)]
    pub variant: Option<String>,
}

impl TryFrom<LineFixture> for CartLineItem {
    type Error = FixtureError;

    fn try_from(line: LineFixture) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId(line.id),
            product_id: ProductId(line.product_id.unwrap_or(line.id)),
            name: line.name,
            unit_price: rupiah(line.price)?,
            quantity: line.quantity,
            unit_weight_grams: line.weight,
            unit_bv: line.bv,
            stock: line.stock.unwrap_or(line.quantity),
            variant: line.variant,
        })
    }
}

/// A voucher in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct VoucherFixture {
    /// Voucher code
    pub code: String,

    /// Discount in percent points
    pub percent: Decimal,
}

/// A checkout scenario
#[derive(Debug, Clone, Deserialize)]
pub struct CartFixture {
    /// Lines in the cart
    pub items: Vec<LineFixture>,

    /// Shipping already negotiated
    #[serde(default)]
    pub shipping: Option<ShippingSelection>,

    /// Applied voucher
    #[serde(default)]
    pub voucher: Option<VoucherFixture>,

    /// Chosen plan
    #[serde(default)]
    pub plan_id: Option<PlanId>,

    /// Payment method
    #[serde(default)]
    pub payment_method: PaymentMethod,

    /// Member profile
    #[serde(default)]
    pub profile: Option<MemberProfile>,

    /// Periods the backend would report
    #[serde(default)]
    pub bv_periods: Vec<BvPeriod>,
}

impl CartFixture {
    /// Load `<base>/carts/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(base_path: impl AsRef<Path>, name: &str) -> Result<Self, FixtureError> {
        let path = base_path
            .as_ref()
            .join("carts")
            .join(format!("{name}.yml"));

        Self::from_path(&path)
    }

    /// Load a fixture from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    /// Parse a fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Build the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a price cannot be represented.
    pub fn cart(&self) -> Result<Cart, FixtureError> {
        let items = self
            .items
            .iter()
            .cloned()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items))
    }

    /// Build a draft with every line selected and the fixture's choices applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a price or the voucher is invalid.
    pub fn draft(&self) -> Result<CheckoutDraft, FixtureError> {
        let mut draft = CheckoutDraft::new(self.cart()?.select_all());

        draft.set_shipping(self.shipping.clone());
        draft.set_plan(self.plan_id);
        draft.set_payment_method(self.payment_method);

        if let Some(voucher) = &self.voucher {
            draft.set_voucher(Some(AppliedVoucher::from_points(
                voucher.code.clone(),
                voucher.percent,
            )?));
        }

        Ok(draft)
    }
}
