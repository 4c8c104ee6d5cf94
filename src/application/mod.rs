//! Application layer containing the redemption orchestration.
//!
//! This module defines the `RedemptionEngine`, the entry point for redeeming,
//! confirming and administering vouchers. It owns the engine's local store and
//! drives the injected collaborators in a fixed order.

pub mod engine;
