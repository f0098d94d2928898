//! Defines the HTTP routes for the catalog.

use super::handlers::*;
use crate::auth::middleware::service_key_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Staff item management; the caller nests it behind `staff_auth`
pub fn staff_catalog_router() -> Router {
    Router::new()
        .route("/items", post(create_item))
        .route("/item", get(get_item))
        .route("/items/delete", post(delete_item))
}

/// Reservation gate for other processes, guarded by the service key
pub fn internal_catalog_router() -> Router {
    Router::new()
        .route("/reserve", post(reserve_items))
        .route("/release", post(release_items))
        .route_layer(middleware::from_fn(service_key_auth))
}
