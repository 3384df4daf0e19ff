//! Checkout Settlement
//!
//! A [`CheckoutDraft`] collects the member's choices while they move through checkout.
//! Before anything is sent to the backend, [`prepare_settlement`] validates the draft
//! against a freshly fetched cart, splits the BV and assembles the [`SettlementRequest`].
//!
//! Validation is ordered and stops at the first failure:
//!
//! 1. a shipping option is selected,
//! 2. a compensation plan is selected,
//! 3. no selected line asks for more than the live stock,
//! 4. a BV period can be resolved (explicit choice, else the first active period).

use std::fmt;

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::{AggregateError, CartTotals},
    bv::{BvError, BvSplit, allocate},
    cart::{Cart, SelectedCartItems},
    discounts::{AppliedVoucher, DiscountError, discounted_subtotal, gross_amount},
    items::{CartLineItem, ItemId, ProductId},
    money::{AmountError, Rupiah, whole_rupiah},
    shipping::{DestinationId, ShippingSelection},
};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Member account id.
    UserId
);

id_type!(
    /// Compensation plan id.
    PlanId
);

id_type!(
    /// BV bookkeeping period id.
    BvPeriodId
);

/// How the member pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Payment gateway; settlement completes on the gateway callback.
    #[default]
    Online,

    /// Cash on delivery; settled as soon as the order is created.
    Cod,
}

/// A BV bookkeeping period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BvPeriod {
    /// Period id
    pub id: BvPeriodId,

    /// Display name, e.g. "Periode Oktober 2026"
    #[serde(default)]
    pub name: String,

    /// First day of the period
    #[serde(default)]
    pub start_date: Option<Date>,

    /// Last day of the period
    #[serde(default)]
    pub end_date: Option<Date>,

    /// Whether transactions may still be booked into the period
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Pick the BV period for a settlement: the explicit choice if it is active, else the
/// first active period.
///
/// # Errors
///
/// Returns [`CheckoutError::UnknownBvPeriod`] if the explicit choice is not active, or
/// [`CheckoutError::NoBvPeriod`] if nothing was chosen and no period is active.
pub fn resolve_bv_period(
    explicit: Option<BvPeriodId>,
    periods: &[BvPeriod],
) -> Result<BvPeriodId, CheckoutError> {
    match explicit {
        Some(id) if periods.iter().any(|period| period.is_active && period.id == id) => Ok(id),
        Some(id) => Err(CheckoutError::UnknownBvPeriod(id)),
        None => periods
            .iter()
            .find(|period| period.is_active)
            .map(|period| period.id)
            .ok_or(CheckoutError::NoBvPeriod),
    }
}

/// The member's saved profile, used for receiver defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Member account id
    pub user_id: UserId,

    /// Full name
    pub name: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Email address, also the cart key
    pub email: String,

    /// Default delivery address
    #[serde(default)]
    pub address: String,
}

/// Who receives the parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiverInfo {
    /// Receiver name
    #[serde(rename = "receiver_name")]
    pub name: String,

    /// Receiver phone
    #[serde(rename = "receiver_phone")]
    pub phone: String,

    /// Receiver email
    #[serde(rename = "receiver_email")]
    pub email: String,

    /// Delivery address
    #[serde(rename = "receiver_address")]
    pub address: String,
}

/// Receiver fields the member edited during checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverOverrides {
    /// Replacement receiver name
    pub name: Option<String>,

    /// Replacement phone
    pub phone: Option<String>,

    /// Replacement email
    pub email: Option<String>,

    /// Replacement address
    pub address: Option<String>,
}

impl ReceiverOverrides {
    /// Merge the overrides over the profile. Blank overrides keep the profile value.
    pub fn resolve(&self, profile: &MemberProfile) -> ReceiverInfo {
        fn pick(edited: Option<&String>, default: &str) -> String {
            edited
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .to_string()
        }

        ReceiverInfo {
            name: pick(self.name.as_ref(), &profile.name),
            phone: pick(self.phone.as_ref(), &profile.phone),
            email: pick(self.email.as_ref(), &profile.email),
            address: pick(self.address.as_ref(), &profile.address),
        }
    }
}

/// Reasons checkout cannot be settled.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// Nothing was selected for checkout.
    #[error("select at least one product to check out")]
    NoItems,

    /// No shipping option chosen.
    #[error("please choose a shipping option")]
    MissingShippingOption,

    /// No compensation plan chosen.
    #[error("please choose a compensation plan")]
    MissingPlan,

    /// A selected line is no longer in the cart.
    #[error("{name} is no longer in your cart")]
    ItemUnavailable {
        /// Line that disappeared
        item: ItemId,

        /// Product name at selection time
        name: String,
    },

    /// A selected line asks for more units than are in stock.
    #[error("only {available} of {name} left in stock, but {requested} requested")]
    InsufficientStock {
        /// Line that is short
        item: ItemId,

        /// Product name
        name: String,

        /// Quantity in the cart
        requested: u32,

        /// Stock reported by the backend
        available: u32,
    },

    /// A selected line's quantity changed in the cart after shipping was quoted.
    #[error("the quantity of {name} changed from {selected} to {live}, please review your order")]
    QuantityChanged {
        /// Line whose quantity moved
        item: ItemId,

        /// Product name
        name: String,

        /// Quantity the member reviewed
        selected: u32,

        /// Quantity now in the cart
        live: u32,
    },

    /// No BV period chosen and none active.
    #[error("no active BV period is available")]
    NoBvPeriod,

    /// The chosen BV period is not active.
    #[error("BV period {0} is not active")]
    UnknownBvPeriod(BvPeriodId),

    /// BV split failed.
    #[error(transparent)]
    Bv(#[from] BvError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Aggregation failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A money amount could not be represented.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Checkout state built up while the member moves through checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutDraft {
    selected: SelectedCartItems,
    shipping: Option<ShippingSelection>,
    voucher: Option<AppliedVoucher>,
    bv_period_id: Option<BvPeriodId>,
    plan_id: Option<PlanId>,
    receiver: ReceiverOverrides,
    payment_method: PaymentMethod,
    checkout_token: Option<String>,
}

impl CheckoutDraft {
    /// Start a draft for the selected lines; every other choice starts unset.
    pub fn new(selected: SelectedCartItems) -> Self {
        Self {
            selected,
            ..Self::default()
        }
    }

    /// Selected lines, as captured when checkout began.
    pub fn selected(&self) -> &SelectedCartItems {
        &self.selected
    }

    /// Totals over the selected lines.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] if the price total overflows.
    pub fn totals(&self) -> Result<CartTotals, AggregateError> {
        self.selected.totals()
    }

    /// Chosen shipping.
    pub fn shipping(&self) -> Option<&ShippingSelection> {
        self.shipping.as_ref()
    }

    /// Set or clear the shipping choice.
    pub fn set_shipping(&mut self, shipping: Option<ShippingSelection>) {
        self.shipping = shipping;
    }

    /// Applied voucher.
    pub fn voucher(&self) -> Option<&AppliedVoucher> {
        self.voucher.as_ref()
    }

    /// Set or clear the voucher.
    pub fn set_voucher(&mut self, voucher: Option<AppliedVoucher>) {
        self.voucher = voucher;
    }

    /// Explicitly chosen BV period.
    pub fn bv_period_id(&self) -> Option<BvPeriodId> {
        self.bv_period_id
    }

    /// Choose a BV period, or `None` to use the first active one.
    pub fn set_bv_period(&mut self, period: Option<BvPeriodId>) {
        self.bv_period_id = period;
    }

    /// Chosen compensation plan.
    pub fn plan_id(&self) -> Option<PlanId> {
        self.plan_id
    }

    /// Choose a compensation plan.
    pub fn set_plan(&mut self, plan: Option<PlanId>) {
        self.plan_id = plan;
    }

    /// Receiver edits.
    pub fn receiver(&self) -> &ReceiverOverrides {
        &self.receiver
    }

    /// Receiver edits, mutably.
    pub fn receiver_mut(&mut self) -> &mut ReceiverOverrides {
        &mut self.receiver
    }

    /// Chosen payment method.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Choose a payment method.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Token of the server-side copy of this draft.
    pub fn checkout_token(&self) -> Option<&str> {
        self.checkout_token.as_deref()
    }

    /// Remember the token of the server-side copy of this draft.
    pub fn set_checkout_token(&mut self, token: Option<String>) {
        self.checkout_token = token;
    }

    /// Checks that need no backend data: something is selected, plus steps 1 and 2.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CheckoutError`].
    pub fn check_selections(&self) -> Result<(&ShippingSelection, PlanId), CheckoutError> {
        if self.selected.is_empty() {
            return Err(CheckoutError::NoItems);
        }

        let shipping = self
            .shipping
            .as_ref()
            .ok_or(CheckoutError::MissingShippingOption)?;

        let plan = self.plan_id.ok_or(CheckoutError::MissingPlan)?;

        Ok((shipping, plan))
    }

    /// Run every check against the live cart.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CheckoutError`].
    pub fn validate(
        &self,
        live: &Cart,
        periods: &[BvPeriod],
    ) -> Result<ValidatedCheckout, CheckoutError> {
        let (shipping, plan_id) = self.check_selections()?;

        let items = self
            .selected
            .items()
            .iter()
            .map(|selected| live_line(selected, live))
            .collect::<Result<Vec<_>, _>>()?;

        let bv_period_id = resolve_bv_period(self.bv_period_id, periods)?;

        Ok(ValidatedCheckout {
            items,
            shipping: shipping.clone(),
            plan_id,
            bv_period_id,
        })
    }
}

fn live_line(selected: &CartLineItem, live: &Cart) -> Result<CartLineItem, CheckoutError> {
    let item = live
        .get_item(selected.id)
        .map_err(|_missing| CheckoutError::ItemUnavailable {
            item: selected.id,
            name: selected.name.clone(),
        })?;

    if item.exceeds_stock() {
        return Err(CheckoutError::InsufficientStock {
            item: item.id,
            name: item.name.clone(),
            requested: item.quantity,
            available: item.stock,
        });
    }

    // Shipping was quoted for the reviewed weight and value.
    if item.quantity != selected.quantity {
        return Err(CheckoutError::QuantityChanged {
            item: item.id,
            name: item.name.clone(),
            selected: selected.quantity,
            live: item.quantity,
        });
    }

    Ok(item.clone())
}

/// A draft that passed every check, carrying the live lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCheckout {
    /// Selected lines as currently in the cart
    pub items: Vec<CartLineItem>,

    /// Chosen shipping
    pub shipping: ShippingSelection,

    /// Chosen compensation plan
    pub plan_id: PlanId,

    /// Resolved BV period
    pub bv_period_id: BvPeriodId,
}

/// A line in the settlement payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementItem {
    /// Cart row id
    pub cart_id: ItemId,

    /// Product id
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Units bought
    pub quantity: u32,

    /// Unit price in whole rupiah
    pub price: i64,

    /// Unit weight in grams
    pub weight: u32,

    /// Unit BV
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub bv: Decimal,

    /// Product variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl From<&CartLineItem> for SettlementItem {
    fn from(item: &CartLineItem) -> Self {
        Self {
            cart_id: item.id,
            product_id: item.product_id,
            name: item.name.clone(),
            quantity: item.quantity,
            price: whole_rupiah(&item.unit_price),
            weight: item.unit_weight_grams,
            bv: item.unit_bv,
            variant: item.variant.clone(),
        }
    }
}

/// Payload for the transaction-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementRequest {
    /// Buying member
    pub user_id: UserId,

    /// Compensation plan
    pub plan_id: PlanId,

    /// Receiver details
    #[serde(flatten)]
    pub receiver: ReceiverInfo,

    /// Receiving destination
    pub receiver_destination_id: DestinationId,

    /// Discounted subtotal plus shipping, in whole rupiah
    pub gross_amount: i64,

    /// Applied voucher code
    pub voucher_code: Option<String>,

    /// Shipping cost in whole rupiah
    pub shipping_cost: i64,

    /// Carrier and service label
    pub shipping_method: String,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Purchased lines
    pub items: Vec<SettlementItem>,

    /// BV period the transaction is booked into
    pub bv_period_id: BvPeriodId,

    /// Total BV
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_bv: Decimal,

    /// BV credited to Plan A
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub bv_plan_a: Decimal,

    /// BV credited to Plan B
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub bv_plan_b: Decimal,
}

/// A validated, priced settlement ready to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Payload to send
    pub request: SettlementRequest,

    /// Totals over the live lines
    pub totals: CartTotals,

    /// Product subtotal after the voucher
    pub discounted_subtotal: Rupiah,

    /// Shipping cost
    pub shipping_cost: Rupiah,

    /// Amount the member pays
    pub gross_amount: Rupiah,

    /// BV split
    pub split: BvSplit,
}

impl Settlement {
    /// Ids of the settled cart lines.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.request.items.iter().map(|item| item.cart_id).collect()
    }
}

/// Validate a draft against the live cart and assemble its settlement.
///
/// # Errors
///
/// Returns the first failing validation as a [`CheckoutError`], or an arithmetic error if
/// an amount cannot be represented.
pub fn prepare_settlement(
    draft: &CheckoutDraft,
    live: &Cart,
    profile: &MemberProfile,
    periods: &[BvPeriod],
) -> Result<Settlement, CheckoutError> {
    let validated = draft.validate(live, periods)?;

    let totals = CartTotals::of(&validated.items)?;
    let discount = draft.voucher().map(|voucher| &voucher.discount);
    let shipping_cost = validated.shipping.option.cost()?;
    let subtotal = discounted_subtotal(&totals.price, discount)?;
    let gross = gross_amount(&totals.price, discount, &shipping_cost)?;
    let split = allocate(totals.bv)?;

    let request = SettlementRequest {
        user_id: profile.user_id,
        plan_id: validated.plan_id,
        receiver: draft.receiver().resolve(profile),
        receiver_destination_id: validated.shipping.destination.id,
        gross_amount: whole_rupiah(&gross),
        voucher_code: draft.voucher().map(|voucher| voucher.code.clone()),
        shipping_cost: whole_rupiah(&shipping_cost),
        shipping_method: validated.shipping.option.label(),
        payment_method: draft.payment_method(),
        items: validated.items.iter().map(SettlementItem::from).collect(),
        bv_period_id: validated.bv_period_id,
        total_bv: split.total_bv,
        bv_plan_a: split.bv_plan_a,
        bv_plan_b: split.bv_plan_b,
    };

    Ok(Settlement {
        request,
        totals,
        discounted_subtotal: subtotal,
        shipping_cost,
        gross_amount: gross,
        split,
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        items::test_support::line,
        shipping::{Destination, ShippingMethod, ShippingOption},
    };

    use super::*;

    fn shipping(cost: i64) -> ShippingSelection {
        ShippingSelection {
            destination: Destination {
                id: DestinationId(31_555),
                label: "KEBAYORAN BARU".to_string(),
                zip_code: None,
            },
            method: ShippingMethod {
                name: "jne".to_string(),
                label: Some("JNE".to_string()),
            },
            option: ShippingOption {
                shipping_name: "JNE".to_string(),
                service_name: "REG".to_string(),
                shipping_cost: cost,
                etd: Some("2-3".to_string()),
            },
        }
    }

    fn profile() -> MemberProfile {
        MemberProfile {
            user_id: UserId(42),
            name: "Siti Rahma".to_string(),
            phone: "08123456789".to_string(),
            email: "siti@example.com".to_string(),
            address: "Jl. Melati 1".to_string(),
        }
    }

    fn period(id: u64, active: bool) -> BvPeriod {
        BvPeriod {
            id: BvPeriodId(id),
            name: format!("Period {id}"),
            start_date: None,
            end_date: None,
            is_active: active,
        }
    }

    fn ready_draft(cart: &Cart) -> CheckoutDraft {
        let mut draft = CheckoutDraft::new(cart.select_all());
        draft.set_shipping(Some(shipping(15_000)));
        draft.set_plan(Some(PlanId(1)));
        draft
    }

    #[test]
    fn missing_shipping_option_blocks_first() {
        let cart = Cart::with_items([line(1, 10_000, 9, 1, 5)]);
        let mut draft = CheckoutDraft::new(cart.select_all());
        draft.set_plan(Some(PlanId(1)));

        assert_eq!(
            draft.validate(&cart, &[period(1, true)]).err(),
            Some(CheckoutError::MissingShippingOption)
        );
    }

    #[test]
    fn missing_plan_blocks_before_stock() {
        let cart = Cart::with_items([line(1, 10_000, 9, 1, 5)]);
        let mut draft = CheckoutDraft::new(cart.select_all());
        draft.set_shipping(Some(shipping(15_000)));

        assert_eq!(
            draft.validate(&cart, &[period(1, true)]).err(),
            Some(CheckoutError::MissingPlan)
        );
    }

    #[test]
    fn stock_is_checked_against_the_live_cart() {
        let at_selection = Cart::with_items([line(1, 10_000, 2, 1, 5)]);
        let draft = ready_draft(&at_selection);
        let live = Cart::with_items([line(1, 10_000, 2, 1, 1)]);

        assert_eq!(
            draft.validate(&live, &[period(1, true)]).err(),
            Some(CheckoutError::InsufficientStock {
                item: ItemId(1),
                name: "Product 1".to_string(),
                requested: 2,
                available: 1,
            })
        );
    }

    #[test]
    fn changed_live_quantity_blocks_settlement() {
        let at_selection = Cart::with_items([line(1, 10_000, 2, 1, 20)]);
        let draft = ready_draft(&at_selection);
        let live = Cart::with_items([line(1, 10_000, 9, 1, 20)]);

        assert_eq!(
            prepare_settlement(&draft, &live, &profile(), &[period(1, true)]).err(),
            Some(CheckoutError::QuantityChanged {
                item: ItemId(1),
                name: "Product 1".to_string(),
                selected: 2,
                live: 9,
            })
        );
    }

    #[test]
    fn stock_shortage_is_reported_before_quantity_change() {
        let at_selection = Cart::with_items([line(1, 10_000, 2, 1, 20)]);
        let draft = ready_draft(&at_selection);
        let live = Cart::with_items([line(1, 10_000, 9, 1, 4)]);

        assert!(
            matches!(
                draft.validate(&live, &[period(1, true)]),
                Err(CheckoutError::InsufficientStock { requested: 9, available: 4, .. })
            ),
            "stock check runs first"
        );
    }

    #[test]
    fn removed_lines_are_unavailable() {
        let at_selection = Cart::with_items([line(1, 10_000, 2, 1, 5)]);
        let draft = ready_draft(&at_selection);

        assert_eq!(
            draft.validate(&Cart::default(), &[period(1, true)]).err(),
            Some(CheckoutError::ItemUnavailable {
                item: ItemId(1),
                name: "Product 1".to_string(),
            })
        );
    }

    #[test]
    fn empty_selection_is_rejected() {
        let draft = CheckoutDraft::default();

        assert_eq!(
            draft.validate(&Cart::default(), &[]).err(),
            Some(CheckoutError::NoItems)
        );
    }

    #[test]
    fn bv_period_defaults_to_first_active() -> TestResult {
        let periods = [period(1, false), period(2, true), period(3, true)];

        assert_eq!(resolve_bv_period(None, &periods)?, BvPeriodId(2));
        assert_eq!(
            resolve_bv_period(Some(BvPeriodId(3)), &periods)?,
            BvPeriodId(3)
        );
        assert_eq!(
            resolve_bv_period(Some(BvPeriodId(1)), &periods),
            Err(CheckoutError::UnknownBvPeriod(BvPeriodId(1)))
        );
        assert_eq!(
            resolve_bv_period(None, &[period(1, false)]),
            Err(CheckoutError::NoBvPeriod)
        );

        Ok(())
    }

    #[test]
    fn no_period_blocks_after_stock() {
        let cart = Cart::with_items([line(1, 10_000, 1, 1, 5)]);

        assert_eq!(
            ready_draft(&cart).validate(&cart, &[]).err(),
            Some(CheckoutError::NoBvPeriod)
        );
    }

    #[test]
    fn minimal_checkout_is_assembled() -> TestResult {
        let cart = Cart::with_items([line(1, 25_000, 1, 10, 5)]);
        let draft = ready_draft(&cart);

        let settlement = prepare_settlement(&draft, &cart, &profile(), &[period(7, true)])?;

        assert_eq!(settlement.request.gross_amount, 40_000);
        assert_eq!(settlement.request.shipping_cost, 15_000);
        assert_eq!(settlement.request.shipping_method, "JNE REG");
        assert_eq!(settlement.request.bv_period_id, BvPeriodId(7));
        assert_eq!(settlement.request.payment_method, PaymentMethod::Online);
        assert_eq!(settlement.request.voucher_code, None);
        assert_eq!(settlement.item_ids(), vec![ItemId(1)]);

        Ok(())
    }

    #[test]
    fn two_item_scenario_with_voucher() -> TestResult {
        let cart = Cart::with_items([line(1, 50_000, 2, 40, 10), line(2, 30_000, 1, 20, 10)]);
        let mut draft = ready_draft(&cart);
        draft.set_voucher(Some(AppliedVoucher::from_points(
            "HEMAT10",
            Decimal::from(10),
        )?));

        let settlement = prepare_settlement(&draft, &cart, &profile(), &[period(1, true)])?;

        assert_eq!(whole_rupiah(&settlement.totals.price), 130_000);
        assert_eq!(settlement.totals.bv, Decimal::from(100));
        assert_eq!(whole_rupiah(&settlement.discounted_subtotal), 117_000);
        assert_eq!(settlement.request.gross_amount, 132_000);
        assert_eq!(settlement.split.bv_plan_a, Decimal::from(100));
        assert_eq!(settlement.split.bv_plan_b, Decimal::ZERO);
        assert_eq!(settlement.request.voucher_code.as_deref(), Some("HEMAT10"));

        Ok(())
    }

    #[test]
    fn receiver_overrides_replace_profile_fields() {
        let overrides = ReceiverOverrides {
            name: Some("Budi".to_string()),
            phone: Some("   ".to_string()),
            email: None,
            address: Some("Jl. Kenanga 5".to_string()),
        };

        let receiver = overrides.resolve(&profile());

        assert_eq!(receiver.name, "Budi");
        assert_eq!(receiver.phone, "08123456789");
        assert_eq!(receiver.email, "siti@example.com");
        assert_eq!(receiver.address, "Jl. Kenanga 5");
    }

    #[test]
    fn settlement_payload_serializes_flat_receiver_and_numeric_bv() -> TestResult {
        let cart = Cart::with_items([line(1, 25_000, 1, 10, 5)]);
        let mut draft = ready_draft(&cart);
        draft.set_payment_method(PaymentMethod::Cod);

        let settlement = prepare_settlement(&draft, &cart, &profile(), &[period(7, true)])?;
        let json = serde_json::to_value(&settlement.request)?;

        assert_eq!(json["receiver_name"], "Siti Rahma");
        assert_eq!(json["payment_method"], "cod");
        assert_eq!(json["bv_plan_a"], 10.0);
        assert_eq!(json["items"][0]["cart_id"], 1);

        Ok(())
    }
}
