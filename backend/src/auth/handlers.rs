//! Handler functions for authentication-related API endpoints.
//!
//! User and staff accounts share the same operations; each public handler
//! fixes the account kind and delegates to `auth::service`.

use crate::api::common::service_error_to_http;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::database::models::AccountKind;
use crate::errors::ServiceError;
use crate::state::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Json as ResponseJson,
};

type TokenResult = Result<ResponseJson<TokenResponse>, (StatusCode, String)>;

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(&state.pool, &state.jwt, &state.config)
}

/// Unknown and expired refresh tokens are both reported as bad requests.
fn refresh_error_to_http(error: ServiceError) -> (StatusCode, String) {
    let (status, body) = service_error_to_http(error);
    if status == StatusCode::NOT_FOUND {
        (StatusCode::BAD_REQUEST, body)
    } else {
        (status, body)
    }
}

async fn register_as(state: AppState, kind: AccountKind, payload: CredentialsRequest) -> TokenResult {
    match auth_service(&state).register(kind, payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

async fn login_as(state: AppState, kind: AccountKind, payload: CredentialsRequest) -> TokenResult {
    match auth_service(&state).authenticate(kind, payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

async fn change_password_as(
    state: AppState,
    kind: AccountKind,
    payload: ChangePasswordRequest,
) -> TokenResult {
    match auth_service(&state).change_password(kind, payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

async fn refresh_as(state: AppState, kind: AccountKind, payload: RefreshTokenRequest) -> TokenResult {
    match auth_service(&state).refresh(kind, payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(refresh_error_to_http(error)),
    }
}

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> TokenResult {
    register_as(state, AccountKind::User, payload).await
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> TokenResult {
    login_as(state, AccountKind::User, payload).await
}

#[axum::debug_handler]
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> TokenResult {
    change_password_as(state, AccountKind::User, payload).await
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> TokenResult {
    refresh_as(state, AccountKind::User, payload).await
}

#[axum::debug_handler]
pub async fn staff_register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> TokenResult {
    register_as(state, AccountKind::Staff, payload).await
}

#[axum::debug_handler]
pub async fn staff_login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> TokenResult {
    login_as(state, AccountKind::Staff, payload).await
}

#[axum::debug_handler]
pub async fn staff_change_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> TokenResult {
    change_password_as(state, AccountKind::Staff, payload).await
}

#[axum::debug_handler]
pub async fn staff_refresh_token(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> TokenResult {
    refresh_as(state, AccountKind::Staff, payload).await
}
