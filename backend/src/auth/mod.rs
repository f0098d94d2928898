//! Authentication module for managing accounts, sessions, and access control.
//!
//! This module provides registration, login, password change and refresh
//! token rotation for user and staff accounts, plus the authorization
//! middleware used by the rest of the API.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
