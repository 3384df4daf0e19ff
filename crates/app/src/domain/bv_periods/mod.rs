//! BV periods

pub mod service;

pub use service::*;
