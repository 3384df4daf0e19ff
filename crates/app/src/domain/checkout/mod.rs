//! Checkout

pub mod drafts;
pub mod flow;
pub mod transactions;

pub use drafts::*;
pub use flow::{CheckoutFlow, CheckoutFlowError, CheckoutOutcome};
pub use transactions::*;
