//! Defines the HTTP routes for cart management.

use super::handlers::*;
use crate::auth::middleware::{jwt_auth, user_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn cart_router() -> Router {
    Router::new()
        .route("/add", post(add_to_cart))
        .route("/remove", post(remove_from_cart))
        .route("/increase", post(increase_quantity))
        .route("/decrease", post(decrease_quantity))
        .route("/list", get(list_cart))
        .route("/clear", post(clear_cart))
        .route_layer(middleware::from_fn(user_auth))
        .route_layer(middleware::from_fn(jwt_auth))
}
