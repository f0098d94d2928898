//! Handler functions for cart endpoints.

use super::models::{CartItemRequest, CartListResponse, CartQuantityRequest};
use crate::api::common::{StatusOk, service_error_to_http, validate_request};
use crate::services::cart_service::CartService;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};

type CartResult<T> = Result<Json<T>, (StatusCode, String)>;

#[axum::debug_handler]
pub async fn add_to_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartQuantityRequest>,
) -> CartResult<StatusOk> {
    validate_request(&payload)?;

    CartService::new(&state.pool)
        .add(claims.account_id(), &payload.item_id, payload.quantity)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(StatusOk::ok()))
}

#[axum::debug_handler]
pub async fn remove_from_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartItemRequest>,
) -> CartResult<StatusOk> {
    validate_request(&payload)?;

    CartService::new(&state.pool)
        .remove(claims.account_id(), &payload.item_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(StatusOk::ok()))
}

#[axum::debug_handler]
pub async fn increase_quantity(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartQuantityRequest>,
) -> CartResult<StatusOk> {
    validate_request(&payload)?;

    CartService::new(&state.pool)
        .increase(claims.account_id(), &payload.item_id, payload.quantity)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(StatusOk::ok()))
}

#[axum::debug_handler]
pub async fn decrease_quantity(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartQuantityRequest>,
) -> CartResult<StatusOk> {
    validate_request(&payload)?;

    CartService::new(&state.pool)
        .decrease(claims.account_id(), &payload.item_id, payload.quantity)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(StatusOk::ok()))
}

#[axum::debug_handler]
pub async fn list_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> CartResult<CartListResponse> {
    let lines = CartService::new(&state.pool)
        .list(claims.account_id())
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(CartListResponse::from(lines)))
}

#[axum::debug_handler]
pub async fn clear_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> CartResult<StatusOk> {
    CartService::new(&state.pool)
        .clear(claims.account_id())
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("Cart cleared for {}", claims.account_id());
    Ok(Json(StatusOk::ok()))
}
