//! Shipping

pub mod records;
pub mod service;
pub mod session;

pub use service::*;
pub use session::{ShippingSession, ShippingSessionError};
