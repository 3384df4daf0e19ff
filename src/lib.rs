//! K-Smart
//!
//! Storefront core for the K-Smart member shop: cart aggregation, BV allocation between
//! compensation plans, shipping negotiation and checkout settlement.
//!
//! Everything here is synchronous and free of IO. The `ksmart-app` crate wires it to the
//! backend.

pub mod aggregate;
pub mod bv;
pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod money;
pub mod prelude;
pub mod shipping;
pub mod summary;
