//! Async application layer for the K-Smart storefront: backend services, cart store,
//! shipping session and checkout flow.

pub mod client;
pub mod config;
pub mod context;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;
