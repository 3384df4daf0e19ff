//! Test Helpers

use async_trait::async_trait;
use ksmart::{
    aggregate::CartTotals,
    checkout::{BvPeriod, BvPeriodId, MemberProfile, SettlementRequest, UserId},
    items::{CartLineItem, ItemId, ProductId},
    money::{AmountError, rupiah},
    shipping::{Destination, DestinationId, ShippingMethod, ShippingOption, ShippingSelection},
};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, oneshot};

use crate::{
    client::BackendError,
    domain::{
        checkout::{TransactionOutcome, TransactionsService},
        shipping::{
            ShippingRatesService,
            records::{DestinationQuery, MethodsQuery, OptionsQuery},
        },
    },
};

/// A cart line with 250 g per unit and product id `id * 10`.
pub(crate) fn line(id: u64, price: i64, quantity: u32, bv: i64, stock: u32) -> CartLineItem {
    CartLineItem {
        id: ItemId(id),
        product_id: ProductId(id * 10),
        name: format!("Product {id}"),
        unit_price: rupiah(price).unwrap_or_else(|_| ksmart::money::zero()),
        quantity,
        unit_weight_grams: 250,
        unit_bv: Decimal::from(bv),
        stock,
        variant: None,
    }
}

pub(crate) fn totals(price: i64, weight_grams: i64) -> Result<CartTotals, AmountError> {
    Ok(CartTotals {
        price: rupiah(price)?,
        weight_kg: Decimal::new(weight_grams, 3),
        bv: Decimal::ZERO,
        item_count: 1,
    })
}

pub(crate) fn destination(id: u64) -> Destination {
    Destination {
        id: DestinationId(id),
        label: format!("Destination {id}"),
        zip_code: None,
    }
}

pub(crate) fn method(name: &str) -> ShippingMethod {
    ShippingMethod {
        name: name.to_string(),
        label: Some(name.to_uppercase()),
    }
}

pub(crate) fn option(carrier: &str, service: &str, cost: i64) -> ShippingOption {
    ShippingOption {
        shipping_name: carrier.to_string(),
        service_name: service.to_string(),
        shipping_cost: cost,
        etd: Some("2-3".to_string()),
    }
}

pub(crate) fn selection(cost: i64) -> ShippingSelection {
    ShippingSelection {
        destination: destination(31_555),
        method: method("jne"),
        option: option("JNE", "REG", cost),
    }
}

pub(crate) fn period(id: u64) -> BvPeriod {
    BvPeriod {
        id: BvPeriodId(id),
        name: format!("Period {id}"),
        start_date: None,
        end_date: None,
        is_active: true,
    }
}

pub(crate) fn profile() -> MemberProfile {
    MemberProfile {
        user_id: UserId(42),
        name: "Siti Rahma".to_string(),
        phone: "08123456789".to_string(),
        email: "siti@example.com".to_string(),
        address: "Jl. Melati 1".to_string(),
    }
}

/// Rates service whose carrier lookups wait until the test releases them, one gate per
/// destination. Options lookups return nothing.
#[derive(Default)]
pub(crate) struct GatedRates {
    gates: Mutex<FxHashMap<DestinationId, oneshot::Receiver<Vec<ShippingMethod>>>>,
}

impl GatedRates {
    /// Hold lookups for `destination` until the returned sender fires.
    pub(crate) async fn gate(
        &self,
        destination: DestinationId,
    ) -> oneshot::Sender<Vec<ShippingMethod>> {
        let (sender, receiver) = oneshot::channel();
        self.gates.lock().await.insert(destination, receiver);
        sender
    }
}

#[async_trait]
impl ShippingRatesService for GatedRates {
    async fn search_destinations(
        &self,
        _query: DestinationQuery,
    ) -> Result<Vec<Destination>, BackendError> {
        Ok(Vec::new())
    }

    async fn shipping_methods(
        &self,
        query: MethodsQuery,
    ) -> Result<Vec<ShippingMethod>, BackendError> {
        let gate = self.gates.lock().await.remove(&query.receiver_destination_id);

        match gate {
            Some(receiver) => receiver
                .await
                .map_err(|_| BackendError::UnexpectedResponse("gate dropped".to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn shipping_options(
        &self,
        _query: OptionsQuery,
    ) -> Result<Vec<ShippingOption>, BackendError> {
        Ok(Vec::new())
    }
}

/// Transactions service that holds a submission until the test releases it.
#[derive(Default)]
pub(crate) struct GatedTransactions {
    gate: Mutex<Option<oneshot::Receiver<TransactionOutcome>>>,
}

impl GatedTransactions {
    pub(crate) async fn gate(&self) -> oneshot::Sender<TransactionOutcome> {
        let (sender, receiver) = oneshot::channel();
        *self.gate.lock().await = Some(receiver);
        sender
    }
}

#[async_trait]
impl TransactionsService for GatedTransactions {
    async fn create_transaction(
        &self,
        _request: &SettlementRequest,
    ) -> Result<TransactionOutcome, BackendError> {
        let gate = self.gate.lock().await.take();

        match gate {
            Some(receiver) => receiver
                .await
                .map_err(|_| BackendError::UnexpectedResponse("gate dropped".to_string())),
            None => Err(BackendError::UnexpectedResponse("no gate".to_string())),
        }
    }
}
