//! Vouchers

pub mod service;

pub use service::*;
