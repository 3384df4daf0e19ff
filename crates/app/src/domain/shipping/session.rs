//! Shipping session.
//!
//! Drives a [`ShippingNegotiation`] against the rates service. Lookups run without holding
//! the negotiation lock, so a newer input can overtake an older lookup; the older
//! response is then discarded by its generation.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use ksmart::{
    aggregate::CartTotals,
    shipping::{
        Destination, DestinationId, MethodsRequest, OptionsRequest, ShippingError,
        ShippingNegotiation, ShippingSelection, ShippingState,
    },
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    client::BackendError,
    domain::shipping::{
        ShippingRatesService,
        records::{MethodsQuery, OptionsQuery},
    },
};

#[derive(Debug, Error)]
pub enum ShippingSessionError {
    #[error(transparent)]
    Shipping(#[from] ShippingError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ShippingSessionError {
    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::Shipping(error) => error.to_string(),
            Self::Backend(error) => error.user_message(),
        }
    }
}

pub struct ShippingSession {
    service: Arc<dyn ShippingRatesService>,
    shipper: DestinationId,
    cod: bool,
    negotiation: Mutex<ShippingNegotiation>,
    in_flight: AtomicUsize,
}

impl std::fmt::Debug for ShippingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingSession")
            .field("shipper", &self.shipper)
            .field("cod", &self.cod)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when a lookup ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ShippingSession {
    /// Start a session shipping from `shipper`. `cod` asks for cash-on-delivery rates.
    pub fn new(service: Arc<dyn ShippingRatesService>, shipper: DestinationId, cod: bool) -> Self {
        Self {
            service,
            shipper,
            cod,
            negotiation: Mutex::new(ShippingNegotiation::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Whether any lookup is still running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Copy of the current negotiation.
    pub async fn snapshot(&self) -> ShippingNegotiation {
        self.negotiation.lock().await.clone()
    }

    /// Current state.
    pub async fn state(&self) -> ShippingState {
        self.negotiation.lock().await.state()
    }

    /// Completed selection, if any.
    pub async fn selection(&self) -> Option<ShippingSelection> {
        self.negotiation.lock().await.selection()
    }

    /// Update the parcel from the selected lines' totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup that is still current fails.
    pub async fn set_cart(
        &self,
        totals: &CartTotals,
    ) -> Result<ShippingState, ShippingSessionError> {
        let request = self.negotiation.lock().await.set_cart(totals);

        self.follow_methods(request).await
    }

    /// Choose or clear the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup that is still current fails.
    pub async fn set_destination(
        &self,
        destination: Option<Destination>,
    ) -> Result<ShippingState, ShippingSessionError> {
        let request = self.negotiation.lock().await.set_destination(destination);

        self.follow_methods(request).await
    }

    /// Choose a carrier.
    ///
    /// # Errors
    ///
    /// Returns an error if the carrier was not offered or its options lookup fails.
    pub async fn select_method(&self, name: &str) -> Result<ShippingState, ShippingSessionError> {
        let request = self.negotiation.lock().await.select_method(name)?;

        self.follow_options(request).await
    }

    /// Choose a service among the loaded options.
    ///
    /// # Errors
    ///
    /// Returns an error if no carrier is chosen or the service was not offered.
    pub async fn select_option(
        &self,
        service_name: &str,
    ) -> Result<ShippingState, ShippingSessionError> {
        let mut negotiation = self.negotiation.lock().await;

        negotiation.select_option(service_name)?;

        Ok(negotiation.state())
    }

    async fn follow_methods(
        &self,
        request: Option<MethodsRequest>,
    ) -> Result<ShippingState, ShippingSessionError> {
        let Some(request) = request else {
            return Ok(self.state().await);
        };

        debug!(
            generation = %request.generation,
            destination = %request.destination_id,
            weight_kg = %request.weight_kg,
            "looking up shipping methods"
        );

        let response = {
            let _in_flight = InFlight::start(&self.in_flight);
            self.service
                .shipping_methods(MethodsQuery::from(&request))
                .await
        };

        let mut negotiation = self.negotiation.lock().await;

        let next = match response {
            Ok(methods) => match negotiation.apply_methods(request.generation, methods) {
                Ok(next) => next,
                Err(stale) => {
                    warn!(%stale, "discarding shipping methods");
                    return Ok(negotiation.state());
                }
            },
            Err(error) => {
                if let Err(stale) = negotiation.fail_methods(request.generation) {
                    warn!(%stale, %error, "discarding failed shipping methods lookup");
                    return Ok(negotiation.state());
                }

                warn!(%error, "shipping methods lookup failed");
                return Err(error.into());
            }
        };

        drop(negotiation);

        match next {
            Some(options) => self.follow_options(options).await,
            None => Ok(self.state().await),
        }
    }

    async fn follow_options(
        &self,
        request: OptionsRequest,
    ) -> Result<ShippingState, ShippingSessionError> {
        debug!(
            generation = %request.generation,
            method = %request.method.name,
            "looking up shipping options"
        );

        let response = {
            let _in_flight = InFlight::start(&self.in_flight);
            self.service
                .shipping_options(OptionsQuery::new(self.shipper, &request, self.cod))
                .await
        };

        let mut negotiation = self.negotiation.lock().await;

        match response {
            Ok(options) => {
                if let Err(stale) = negotiation.apply_options(request.generation, options) {
                    warn!(%stale, "discarding shipping options");
                }
            }
            Err(error) => {
                if let Err(stale) = negotiation.fail_options(request.generation) {
                    warn!(%stale, %error, "discarding failed shipping options lookup");
                } else {
                    warn!(%error, "shipping options lookup failed");
                    return Err(error.into());
                }
            }
        }

        Ok(negotiation.state())
    }
}
