//! Domain model: value types, records and the ports the engine depends on.

pub mod amount;
pub mod config;
pub mod identity;
pub mod ports;
pub mod redemption;
pub mod voucher;
