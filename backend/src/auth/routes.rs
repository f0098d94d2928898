//! Defines the HTTP routes specifically for authentication.
//!
//! User accounts live at the top of the router, staff accounts under
//! `/staff`. None of these routes require a token.

use crate::auth::handlers::*;
use axum::{Router, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/refresh", post(refresh_token))
        .route("/staff/register", post(staff_register))
        .route("/staff/login", post(staff_login))
        .route("/staff/change-password", post(staff_change_password))
        .route("/staff/refresh", post(staff_refresh_token))
}
