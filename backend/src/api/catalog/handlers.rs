//! Handler functions for catalog endpoints.

use crate::api::common::{ApiResponse, StatusOk, service_error_to_http, validate_request};
use crate::database::models::{CatalogItem, CreateCatalogItem};
use crate::services::reservation_gate::{ReservationGate, ReservationRequest, ReservationResponse};
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
};
use serde::Deserialize;

type CatalogResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, String)>;

#[derive(Debug, Deserialize)]
pub struct ItemIdRequest {
    pub item_id: String,
}

/// Lists a new item; the calling staff member becomes its seller
#[axum::debug_handler]
pub async fn create_item(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCatalogItem>,
) -> CatalogResult<CatalogItem> {
    validate_request(&payload)?;

    let item = state
        .catalog
        .create_item(claims.account_id(), payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(item, "Item created successfully")))
}

#[axum::debug_handler]
pub async fn get_item(
    Extension(state): Extension<AppState>,
    Query(query): Query<ItemIdRequest>,
) -> CatalogResult<CatalogItem> {
    let item = state
        .catalog
        .get_item_required(&query.item_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::ok(item)))
}

#[axum::debug_handler]
pub async fn delete_item(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ItemIdRequest>,
) -> CatalogResult<StatusOk> {
    state
        .catalog
        .delete_item(&payload.item_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(StatusOk::ok(), "Item deleted")))
}

/// Internal: reserves one unit per listed id
#[axum::debug_handler]
pub async fn reserve_items(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReservationRequest>,
) -> CatalogResult<ReservationResponse> {
    let successful = state
        .catalog
        .reserve(&payload.item_ids)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::ok(ReservationResponse { successful })))
}

/// Internal: returns one unit per listed id
#[axum::debug_handler]
pub async fn release_items(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReservationRequest>,
) -> CatalogResult<StatusOk> {
    state
        .catalog
        .release(&payload.item_ids)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::ok(StatusOk::ok())))
}
