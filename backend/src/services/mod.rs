//! Module for core business logic services.
//!
//! Services enforce the storefront rules on top of the repositories: cart
//! bookkeeping, the catalog's reservation gate and the order workflow that
//! ties the two together.

pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod reservation_gate;
