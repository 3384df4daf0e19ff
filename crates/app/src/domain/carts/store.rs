//! Cart store.
//!
//! Holds the last cart the backend reported and publishes it to subscribers. Every
//! mutation is followed by a refetch; local state is never patched in place.

use std::sync::Arc;

use ksmart::{
    cart::Cart,
    items::{CartLineItem, ItemId, ProductId, QuantityChange},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::carts::{
    CartsService,
    errors::CartStoreError,
    records::{DecreaseCartItem, NewCartItem},
};

/// Whether the member confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The member agreed.
    Confirmed,

    /// Not asked yet, or declined.
    Unconfirmed,
}

pub struct CartStore {
    service: Arc<dyn CartsService>,
    email: String,
    sender: watch::Sender<Cart>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("email", &self.email)
            .field("cart", &*self.sender.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store for a member's cart. It starts empty until [`CartStore::refresh`].
    pub fn new(service: Arc<dyn CartsService>, email: impl Into<String>) -> Self {
        let (sender, _receiver) = watch::channel(Cart::default());

        Self {
            service,
            email: email.into(),
            sender,
        }
    }

    /// Receive every cart published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.sender.subscribe()
    }

    /// The last published cart.
    pub fn snapshot(&self) -> Cart {
        self.sender.borrow().clone()
    }

    /// Units in the cart, as shown on the badge.
    pub fn badge_count(&self) -> u64 {
        self.sender.borrow().badge_count()
    }

    /// Fetch the cart and publish it.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the published cart is left unchanged.
    pub async fn refresh(&self) -> Result<Cart, CartStoreError> {
        let cart = self.service.get_cart(&self.email).await.map_err(|error| {
            warn!(email = %self.email, %error, "cart refresh failed");
            error
        })?;

        debug!(lines = cart.len(), badge = cart.badge_count(), "cart refreshed");

        self.sender.send_replace(cart.clone());

        Ok(cart)
    }

    /// Add units of a product, then refetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the addition or the refetch fails.
    pub async fn add(
        &self,
        product_id: ProductId,
        quantity: u32,
        variant: Option<String>,
    ) -> Result<Cart, CartStoreError> {
        self.service
            .add_item(NewCartItem {
                user_email: self.email.clone(),
                product_id,
                quantity,
                variant,
            })
            .await?;

        self.refresh().await
    }

    /// Add one unit to a line, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Quantity`] without calling the backend if the line is
    /// already at its stock, or an error if the backend call fails.
    pub async fn increase(&self, id: ItemId) -> Result<Cart, CartStoreError> {
        let item = self.line(id)?;

        item.increased_quantity()?;

        self.add(item.product_id, 1, item.variant).await
    }

    /// Take one unit off a line, then refetch.
    ///
    /// A line at quantity 1 is removed instead, which needs confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::ConfirmationRequired`] if the line would be removed
    /// without confirmation, or an error if the backend call fails.
    pub async fn decrease(
        &self,
        id: ItemId,
        confirmation: Confirmation,
    ) -> Result<Cart, CartStoreError> {
        let item = self.line(id)?;

        match item.decreased_quantity() {
            QuantityChange::Set(_) => {
                self.service
                    .decrease_item(DecreaseCartItem {
                        user_email: self.email.clone(),
                        product_id: item.product_id,
                        quantity: 1,
                    })
                    .await?;

                self.refresh().await
            }
            QuantityChange::Remove => self.remove(id, confirmation).await,
        }
    }

    /// Delete a line, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::ConfirmationRequired`] without calling the backend unless
    /// confirmed, or an error if the backend call fails.
    pub async fn remove(
        &self,
        id: ItemId,
        confirmation: Confirmation,
    ) -> Result<Cart, CartStoreError> {
        if confirmation != Confirmation::Confirmed {
            return Err(CartStoreError::ConfirmationRequired(id));
        }

        self.service.remove_item(id).await?;

        self.refresh().await
    }

    /// Drop the lines an order settled, then refetch.
    ///
    /// The order already exists, so a failed removal is logged and the rest still go ahead.
    ///
    /// # Errors
    ///
    /// Returns an error if the refetch fails.
    pub async fn clear_settled(&self, ids: &[ItemId]) -> Result<Cart, CartStoreError> {
        for &id in ids {
            if let Err(error) = self.service.remove_item(id).await {
                warn!(item = %id, %error, "failed to remove settled cart line");
            }
        }

        self.refresh().await
    }

    fn line(&self, id: ItemId) -> Result<CartLineItem, CartStoreError> {
        Ok(self.sender.borrow().get_item(id)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate::eq};
    use testresult::TestResult;

    use crate::{
        client::BackendError,
        domain::carts::{MockCartsService, records::DecreaseCartItem},
        test::helpers::line,
    };

    use super::*;

    const EMAIL: &str = "siti@example.com";

    fn cart(quantity: u32, stock: u32) -> Cart {
        Cart::with_items([line(1, 50_000, quantity, 40, stock)])
    }

    async fn loaded_store(mut service: MockCartsService, initial: Cart) -> TestResult<CartStore> {
        service
            .expect_get_cart()
            .once()
            .return_once(move |_| Ok(initial));

        let store = CartStore::new(Arc::new(service), EMAIL);
        store.refresh().await?;

        Ok(store)
    }

    #[tokio::test]
    async fn refresh_publishes_to_subscribers() -> TestResult {
        let mut service = MockCartsService::new();

        service
            .expect_get_cart()
            .once()
            .withf(|email| email == EMAIL)
            .return_once(|_| Ok(cart(3, 10)));

        let store = CartStore::new(Arc::new(service), EMAIL);
        let mut receiver = store.subscribe();

        store.refresh().await?;

        assert!(receiver.has_changed()?, "subscriber should be notified");
        assert_eq!(receiver.borrow_and_update().badge_count(), 3);
        assert_eq!(store.badge_count(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn increase_adds_one_unit_and_refetches() -> TestResult {
        let mut service = MockCartsService::new();
        let mut seq = Sequence::new();

        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(cart(2, 10)));

        service
            .expect_add_item()
            .once()
            .in_sequence(&mut seq)
            .with(eq(NewCartItem {
                user_email: EMAIL.to_string(),
                product_id: ProductId(10),
                quantity: 1,
                variant: None,
            }))
            .return_once(|_| Ok(()));

        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(cart(3, 10)));

        let store = CartStore::new(Arc::new(service), EMAIL);
        store.refresh().await?;

        let updated = store.increase(ItemId(1)).await?;

        assert_eq!(updated.badge_count(), 3);
        assert_eq!(store.snapshot(), updated);

        Ok(())
    }

    #[tokio::test]
    async fn increase_at_stock_makes_no_backend_call() -> TestResult {
        let mut service = MockCartsService::new();
        service.expect_add_item().never();

        let store = loaded_store(service, cart(3, 3)).await?;

        let result = store.increase(ItemId(1)).await;

        assert!(
            matches!(result, Err(CartStoreError::Quantity(_))),
            "expected stock error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn decrease_above_one_calls_decrease() -> TestResult {
        let mut service = MockCartsService::new();

        service
            .expect_decrease_item()
            .once()
            .with(eq(DecreaseCartItem {
                user_email: EMAIL.to_string(),
                product_id: ProductId(10),
                quantity: 1,
            }))
            .return_once(|_| Ok(()));

        let mut seq = Sequence::new();
        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(cart(2, 10)));
        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(cart(1, 10)));

        let store = CartStore::new(Arc::new(service), EMAIL);
        store.refresh().await?;

        let updated = store.decrease(ItemId(1), Confirmation::Unconfirmed).await?;

        assert_eq!(updated.badge_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn decrease_at_one_needs_confirmation() -> TestResult {
        let mut service = MockCartsService::new();
        service.expect_remove_item().never();
        service.expect_decrease_item().never();

        let store = loaded_store(service, cart(1, 10)).await?;

        let result = store.decrease(ItemId(1), Confirmation::Unconfirmed).await;

        assert!(
            matches!(result, Err(CartStoreError::ConfirmationRequired(ItemId(1)))),
            "expected confirmation request, got {result:?}"
        );
        assert_eq!(store.badge_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn confirmed_decrease_at_one_removes_line() -> TestResult {
        let mut service = MockCartsService::new();
        let mut seq = Sequence::new();

        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(cart(1, 10)));
        service
            .expect_remove_item()
            .once()
            .in_sequence(&mut seq)
            .with(eq(ItemId(1)))
            .return_once(|_| Ok(()));
        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(Cart::default()));

        let store = CartStore::new(Arc::new(service), EMAIL);
        store.refresh().await?;

        let updated = store.decrease(ItemId(1), Confirmation::Confirmed).await?;

        assert!(updated.is_empty(), "line should be gone");
        assert_eq!(store.badge_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn clearing_settled_lines_publishes_refetched_cart() -> TestResult {
        let mut service = MockCartsService::new();
        let mut seq = Sequence::new();

        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| {
                Ok(Cart::with_items([
                    line(1, 50_000, 2, 40, 10),
                    line(2, 30_000, 1, 20, 10),
                ]))
            });
        service
            .expect_remove_item()
            .once()
            .in_sequence(&mut seq)
            .with(eq(ItemId(1)))
            .return_once(|_| Err(BackendError::Rejected { message: None }.into()));
        service
            .expect_remove_item()
            .once()
            .in_sequence(&mut seq)
            .with(eq(ItemId(2)))
            .return_once(|_| Ok(()));
        service
            .expect_get_cart()
            .once()
            .in_sequence(&mut seq)
            .return_once(|_| Ok(Cart::with_items([line(1, 50_000, 2, 40, 10)])));

        let store = CartStore::new(Arc::new(service), EMAIL);
        store.refresh().await?;
        let mut receiver = store.subscribe();

        let updated = store.clear_settled(&[ItemId(1), ItemId(2)]).await?;

        assert!(receiver.has_changed()?, "subscriber should see the refetch");
        assert_eq!(updated.badge_count(), 2);
        assert_eq!(store.snapshot(), updated);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_line_is_reported() -> TestResult {
        let store = loaded_store(MockCartsService::new(), Cart::default()).await?;

        let result = store.increase(ItemId(5)).await;

        assert!(
            matches!(result, Err(CartStoreError::Cart(_))),
            "expected missing line, got {result:?}"
        );

        Ok(())
    }
}
