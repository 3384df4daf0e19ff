//! Checkout drafts service.
//!
//! The backend keeps a copy of the lines a member took to checkout so the page can be
//! reloaded. The copy is addressed by a checkout token.

use async_trait::async_trait;
use ksmart::{cart::SelectedCartItems, items::CartLineItem};
use mockall::automock;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    client::{BackendClient, BackendError},
    domain::carts::{CartsServiceError, records::CartItemRecord},
};

/// Stored checkout draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_token: Option<String>,

    pub selected_products: Vec<CartItemRecord>,
}

impl DraftRecord {
    /// Record for a selection, optionally replacing an existing draft.
    pub fn new(selected: &SelectedCartItems, checkout_token: Option<String>) -> Self {
        Self {
            checkout_token,
            selected_products: selected.items().iter().map(CartItemRecord::from).collect(),
        }
    }

    /// Selection stored in the record.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored line has an invalid price.
    pub fn selection(&self) -> Result<SelectedCartItems, CartsServiceError> {
        let items = self
            .selected_products
            .iter()
            .cloned()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SelectedCartItems::from(items))
    }
}

#[derive(Debug, Deserialize)]
struct SavedDraft {
    checkout_token: String,
}

#[derive(Debug, Clone)]
pub struct HttpCheckoutDraftsService {
    client: BackendClient,
}

impl HttpCheckoutDraftsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CheckoutDraftsService for HttpCheckoutDraftsService {
    async fn save_draft(&self, draft: &DraftRecord) -> Result<String, BackendError> {
        let saved: SavedDraft = self
            .client
            .send(Method::POST, &["api", "checkout-temp"], draft)
            .await?;

        Ok(saved.checkout_token)
    }

    async fn load_draft(&self, token: &str) -> Result<DraftRecord, BackendError> {
        self.client.get(&["api", "checkout-temp", token], &()).await
    }

    async fn delete_draft(&self, token: &str) -> Result<(), BackendError> {
        self.client
            .send_unit::<()>(Method::DELETE, &["api", "checkout-temp", token], None)
            .await
    }
}

#[automock]
#[async_trait]
pub trait CheckoutDraftsService: Send + Sync {
    /// Store a draft and return its token.
    async fn save_draft(&self, draft: &DraftRecord) -> Result<String, BackendError>;

    /// Load a stored draft.
    async fn load_draft(&self, token: &str) -> Result<DraftRecord, BackendError>;

    /// Delete a stored draft.
    async fn delete_draft(&self, token: &str) -> Result<(), BackendError>;
}
