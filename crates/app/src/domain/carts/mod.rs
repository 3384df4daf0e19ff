//! Carts

pub mod errors;
pub mod records;
pub mod service;
pub mod store;

pub use errors::{CartStoreError, CartsServiceError};
pub use service::*;
pub use store::{CartStore, Confirmation};
