//! Shipping rates service.

use async_trait::async_trait;
use ksmart::shipping::{Destination, ShippingMethod, ShippingOption};
use mockall::automock;

use crate::{
    client::{BackendClient, BackendError, Envelope},
    domain::shipping::records::{DestinationQuery, MethodsQuery, OptionsQuery, OptionsResponse},
};

#[derive(Debug, Clone)]
pub struct HttpShippingRatesService {
    client: BackendClient,
}

impl HttpShippingRatesService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ShippingRatesService for HttpShippingRatesService {
    async fn search_destinations(
        &self,
        query: DestinationQuery,
    ) -> Result<Vec<Destination>, BackendError> {
        let envelope: Envelope<Vec<Destination>> = self
            .client
            .get(&["api", "search-destination"], &query)
            .await?;

        envelope.into_data()
    }

    async fn shipping_methods(
        &self,
        query: MethodsQuery,
    ) -> Result<Vec<ShippingMethod>, BackendError> {
        let envelope: Envelope<Vec<ShippingMethod>> = self
            .client
            .get(&["api", "shipping-methods"], &query)
            .await?;

        envelope.into_data()
    }

    async fn shipping_options(
        &self,
        query: OptionsQuery,
    ) -> Result<Vec<ShippingOption>, BackendError> {
        let response: OptionsResponse = self
            .client
            .get(&["api", "calculate-shipping"], &query)
            .await?;

        Ok(response.shipping_options)
    }
}

#[automock]
#[async_trait]
pub trait ShippingRatesService: Send + Sync {
    /// Search destinations by keyword.
    async fn search_destinations(
        &self,
        query: DestinationQuery,
    ) -> Result<Vec<Destination>, BackendError>;

    /// Carriers serving a destination for a parcel.
    async fn shipping_methods(
        &self,
        query: MethodsQuery,
    ) -> Result<Vec<ShippingMethod>, BackendError>;

    /// Priced options for a parcel.
    async fn shipping_options(
        &self,
        query: OptionsQuery,
    ) -> Result<Vec<ShippingOption>, BackendError>;
}
