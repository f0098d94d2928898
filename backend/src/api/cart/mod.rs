//! Module for cart API endpoints.
//!
//! Every route acts on the cart of the account named by the access token.

pub mod handlers;
pub mod models;
pub mod routes;
