//! K-Smart Domain Concerns

pub mod bv_periods;
pub mod carts;
pub mod checkout;
pub mod shipping;
pub mod vouchers;
