//! Handler functions for order endpoints.
//!
//! The owning user always comes from the verified access token, except for
//! the staff progression endpoint which names the customer explicitly.

use super::models::*;
use crate::api::common::{StatusOk, service_error_to_http, validate_request};
use crate::database::models::OrderStatus;
use crate::errors::ServiceError;
use crate::services::order_service::OrderService;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
};
use std::str::FromStr;

type OrderResult<T> = Result<Json<T>, (StatusCode, String)>;

fn order_service(state: &AppState) -> OrderService<'_> {
    OrderService::new(&state.pool, state.gate.as_ref())
}

/// Turns the caller's cart into an order
#[axum::debug_handler]
pub async fn place_order(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> OrderResult<PlaceOrderResponse> {
    let placed = order_service(&state)
        .place_order(claims.account_id())
        .await
        .map_err(|e| {
            tracing::error!("Placing order for {} failed: {}", claims.account_id(), e);
            service_error_to_http(e)
        })?;

    Ok(Json(PlaceOrderResponse::from(placed)))
}

/// Cancels one of the caller's orders
#[axum::debug_handler]
pub async fn remove_order(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<OrderIdRequest>,
) -> OrderResult<StatusOk> {
    order_service(&state)
        .remove_order(claims.account_id(), payload.order_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(StatusOk::ok()))
}

#[axum::debug_handler]
pub async fn order_status(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<OrderIdRequest>,
) -> OrderResult<OrderStatusResponse> {
    let status = order_service(&state)
        .order_status(claims.account_id(), query.order_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(OrderStatusResponse { status }))
}

#[axum::debug_handler]
pub async fn order_items(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<OrderIdRequest>,
) -> OrderResult<OrderItemsResponse> {
    let lines = order_service(&state)
        .order_lines(claims.account_id(), query.order_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(OrderItemsResponse::from(lines)))
}

/// Lists the caller's orders, optionally filtered by `?status=`
#[axum::debug_handler]
pub async fn list_orders(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<OrderListQuery>,
) -> OrderResult<OrderListResponse> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            OrderStatus::from_str(raw)
                .map_err(|e| service_error_to_http(ServiceError::validation(e)))?,
        ),
    };

    let orders = order_service(&state)
        .list_orders(claims.account_id(), status)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(OrderListResponse::from(orders)))
}

/// Staff: moves a customer's order to its next fulfilment state
#[axum::debug_handler]
pub async fn advance_order(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AdvanceOrderRequest>,
) -> OrderResult<OrderStatusResponse> {
    validate_request(&payload)?;

    let status = order_service(&state)
        .advance_order(&payload.user_id, payload.order_id)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!(
        "Staff {} advanced order {} of {} to {}",
        claims.account_id(),
        payload.order_id,
        payload.user_id,
        status
    );
    Ok(Json(OrderStatusResponse { status }))
}
