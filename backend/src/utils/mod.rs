//! Collection of general utility functions.
//!
//! Token minting/verification and random string generation shared by the
//! authentication service and middleware.

pub mod generate_random_string;
pub mod jwt;
