//! Module for catalog API endpoints.
//!
//! Staff manage listed items; other storefront processes reach the
//! reservation gate through the internal routes.

pub mod handlers;
pub mod routes;
