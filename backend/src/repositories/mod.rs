//! Data access layer.
//!
//! Each repository borrows the shared SQLite pool and owns the SQL for one
//! table family; business rules live in the services.

pub mod account_repository;
pub mod cart_repository;
pub mod catalog_repository;
pub mod order_repository;
