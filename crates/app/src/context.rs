//! App Context

use std::sync::Arc;

use ksmart::shipping::DestinationId;
use thiserror::Error;

use crate::{
    client::{BackendClient, BackendConfig, BackendError},
    domain::{
        bv_periods::{BvPeriodsService, HttpBvPeriodsService},
        carts::{CartStore, CartsService, HttpCartsService},
        checkout::{
            CheckoutDraftsService, CheckoutFlow, HttpCheckoutDraftsService,
            HttpTransactionsService, TransactionsService,
        },
        shipping::{HttpShippingRatesService, ShippingRatesService, ShippingSession},
        vouchers::{HttpVouchersService, VouchersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to create backend client")]
    Backend(#[source] BackendError),
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
    pub shipping: Arc<dyn ShippingRatesService>,
    pub vouchers: Arc<dyn VouchersService>,
    pub bv_periods: Arc<dyn BvPeriodsService>,
    pub transactions: Arc<dyn TransactionsService>,
    pub drafts: Arc<dyn CheckoutDraftsService>,
    pub shipper: DestinationId,
}

impl AppContext {
    /// Build application context talking to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend client cannot be created.
    pub fn from_backend_config(
        config: BackendConfig,
        shipper: DestinationId,
    ) -> Result<Self, AppInitError> {
        let client = BackendClient::new(config).map_err(AppInitError::Backend)?;

        Ok(Self {
            carts: Arc::new(HttpCartsService::new(client.clone())),
            shipping: Arc::new(HttpShippingRatesService::new(client.clone())),
            vouchers: Arc::new(HttpVouchersService::new(client.clone())),
            bv_periods: Arc::new(HttpBvPeriodsService::new(client.clone())),
            transactions: Arc::new(HttpTransactionsService::new(client.clone())),
            drafts: Arc::new(HttpCheckoutDraftsService::new(client)),
            shipper,
        })
    }

    /// Cart store for a member.
    pub fn cart_store(&self, email: impl Into<String>) -> CartStore {
        CartStore::new(self.carts.clone(), email)
    }

    /// Shipping session for one checkout.
    pub fn shipping_session(&self, cod: bool) -> ShippingSession {
        ShippingSession::new(self.shipping.clone(), self.shipper, cod)
    }

    /// Checkout flow sharing this context's services.
    pub fn checkout_flow(&self) -> CheckoutFlow {
        CheckoutFlow::new(
            self.bv_periods.clone(),
            self.transactions.clone(),
            self.drafts.clone(),
        )
    }
}
