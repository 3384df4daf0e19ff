//! Cart errors.

use ksmart::{
    cart::CartError,
    items::{ItemId, QuantityError},
    money::AmountError,
};
use thiserror::Error;

use crate::client::BackendError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("cart line {item} has an invalid price")]
    InvalidRecord {
        item: ItemId,
        #[source]
        source: AmountError,
    },
}

impl CartsServiceError {
    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(error) => error.user_message(),
            Self::InvalidRecord { .. } => crate::client::GENERIC_FAILURE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    /// Removing this line needs the member's confirmation.
    #[error("removing item {0} from the cart needs confirmation")]
    ConfirmationRequired(ItemId),

    #[error(transparent)]
    Service(#[from] CartsServiceError),
}

impl CartStoreError {
    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::Service(error) => error.user_message(),
            Self::Cart(_) | Self::Quantity(_) | Self::ConfirmationRequired(_) => self.to_string(),
        }
    }
}
