//! Carts service.

use async_trait::async_trait;
use ksmart::{
    cart::Cart,
    items::{CartLineItem, ItemId},
};
use mockall::automock;
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::{
    client::BackendClient,
    domain::carts::{
        errors::CartsServiceError,
        records::{CartItemRecord, DecreaseCartItem, NewCartItem},
    },
};

#[derive(Debug, Clone)]
pub struct HttpCartsService {
    client: BackendClient,
}

impl HttpCartsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct CartQuery<'a> {
    email: &'a str,
}

#[async_trait]
impl CartsService for HttpCartsService {
    async fn get_cart(&self, email: &str) -> Result<Cart, CartsServiceError> {
        let records: Vec<CartItemRecord> = self
            .client
            .get(&["api", "cart"], &CartQuery { email })
            .await?;

        debug!(lines = records.len(), "fetched cart");

        let items = records
            .into_iter()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items))
    }

    async fn add_item(&self, item: NewCartItem) -> Result<(), CartsServiceError> {
        self.client
            .send_unit(Method::POST, &["api", "cart"], Some(&item))
            .await?;

        Ok(())
    }

    async fn decrease_item(&self, item: DecreaseCartItem) -> Result<(), CartsServiceError> {
        self.client
            .send_unit(Method::PUT, &["api", "cart", "decrease"], Some(&item))
            .await?;

        Ok(())
    }

    async fn remove_item(&self, item: ItemId) -> Result<(), CartsServiceError> {
        self.client
            .send_unit::<()>(Method::DELETE, &["api", "cart", &item.to_string()], None)
            .await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the member's cart.
    async fn get_cart(&self, email: &str) -> Result<Cart, CartsServiceError>;

    /// Add units of a product to the cart.
    async fn add_item(&self, item: NewCartItem) -> Result<(), CartsServiceError>;

    /// Take units of a product out of the cart.
    async fn decrease_item(&self, item: DecreaseCartItem) -> Result<(), CartsServiceError>;

    /// Delete a cart line.
    async fn remove_item(&self, item: ItemId) -> Result<(), CartsServiceError>;
}
