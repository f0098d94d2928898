//! Defines the HTTP routes for orders.

use super::handlers::*;
use crate::auth::middleware::{jwt_auth, user_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Customer routes, nested under `/order`
pub fn order_router() -> Router {
    Router::new()
        .route("/place", post(place_order))
        .route("/remove", post(remove_order))
        .route("/status", get(order_status))
        .route("/items", get(order_items))
        .route("/list", get(list_orders))
        .route_layer(middleware::from_fn(user_auth))
        .route_layer(middleware::from_fn(jwt_auth))
}

/// Staff routes; the caller nests them behind `staff_auth`
pub fn staff_order_router() -> Router {
    Router::new().route("/advance", post(advance_order))
}
