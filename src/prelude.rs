//! K-Smart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    aggregate::{AggregateError, CartTotals},
    bv::{BvError, BvRule, BvSplit, allocate},
    cart::{Cart, CartError, SelectedCartItems},
    checkout::{
        BvPeriod, BvPeriodId, CheckoutDraft, CheckoutError, MemberProfile, PaymentMethod, PlanId,
        ReceiverInfo, ReceiverOverrides, Settlement, SettlementItem, SettlementRequest, UserId,
        prepare_settlement, resolve_bv_period,
    },
    discounts::{AppliedVoucher, DiscountError},
    items::{CartLineItem, ItemId, ProductId, QuantityChange, QuantityError},
    money::{AmountError, Rupiah},
    shipping::{
        Destination, DestinationId, Generation, MethodsRequest, OptionsRequest, ShippingError,
        ShippingMethod, ShippingNegotiation, ShippingOption, ShippingSelection, ShippingState,
        StaleResponse,
    },
    summary::{OrderSummary, SummaryError},
};
