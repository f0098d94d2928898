//! Module for order API endpoints.
//!
//! Customers place, inspect and cancel their own orders; staff move orders
//! through fulfilment.

pub mod handlers;
pub mod models;
pub mod routes;
