//! Cart

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    aggregate::{AggregateError, CartTotals, total_item_count},
    items::{CartLineItem, ItemId},
};

/// Errors related to cart lookups and selections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// An item was not found in the cart.
    #[error("item {0} not found in cart")]
    ItemNotFound(ItemId),
}

/// The member's cart as last reported by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create a cart from backend line items.
    pub fn with_items(items: impl Into<Vec<CartLineItem>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Get a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this id.
    pub fn get_item(&self, id: ItemId) -> Result<&CartLineItem, CartError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(CartError::ItemNotFound(id))
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// Lines in the cart.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units in the cart, as shown on the cart badge.
    pub fn badge_count(&self) -> u64 {
        total_item_count(&self.items)
    }

    /// Select lines for checkout, keeping cart order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if any id is not in the cart.
    pub fn select(&self, ids: &[ItemId]) -> Result<SelectedCartItems, CartError> {
        let wanted: FxHashSet<ItemId> = ids.iter().copied().collect();

        if let Some(missing) = ids.iter().find(|id| self.get_item(**id).is_err()) {
            return Err(CartError::ItemNotFound(*missing));
        }

        Ok(SelectedCartItems {
            items: self
                .items
                .iter()
                .filter(|item| wanted.contains(&item.id))
                .cloned()
                .collect(),
        })
    }

    /// Select every line in the cart.
    pub fn select_all(&self) -> SelectedCartItems {
        SelectedCartItems {
            items: self.items.clone(),
        }
    }
}

/// Lines the member picked for checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedCartItems {
    items: Vec<CartLineItem>,
}

impl SelectedCartItems {
    /// Ids of the selected lines.
    pub fn ids(&self) -> SmallVec<[ItemId; 8]> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Selected lines.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Aggregate totals over the selection.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] if the price total overflows.
    pub fn totals(&self) -> Result<CartTotals, AggregateError> {
        CartTotals::of(&self.items)
    }

    /// Re-read the selection from a fresher cart. Lines no longer in the cart are dropped.
    pub fn refreshed_from(&self, cart: &Cart) -> Self {
        let ids = self.ids();

        Self {
            items: cart
                .iter()
                .filter(|item| ids.contains(&item.id))
                .cloned()
                .collect(),
        }
    }
}

impl From<Vec<CartLineItem>> for SelectedCartItems {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self { items }
    }
}
