//! Middleware for protecting authenticated routes and handling authorization.
//!
//! `jwt_auth` validates the bearer access token and exposes its `Claims` to
//! handlers; `staff_auth` and `user_auth` run after it to keep staff and
//! customer routes apart. Internal catalog routes are guarded by the shared
//! service key instead.

use crate::api::common::service_error_to_http;
use crate::errors::ServiceError;
use crate::services::reservation_gate::SERVICE_KEY_HEADER;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::Request,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use constant_time_eq::constant_time_eq;
use tracing::warn;

type Rejection = (StatusCode, String);

fn missing_state() -> Rejection {
    service_error_to_http(ServiceError::internal_error("Application state not attached"))
}

/// JWT authentication middleware
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, Rejection> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Missing bearer token")))?;

    let state = request
        .extensions()
        .get::<AppState>()
        .ok_or_else(missing_state)?;

    match state.jwt.validate_token(token) {
        Ok(claims) => {
            // Add claims to request extensions for use in handlers
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("Rejected access token: {}", e);
            Err(service_error_to_http(e))
        }
    }
}

/// Staff authorization middleware; expects `jwt_auth` to have run first
pub async fn staff_auth(request: Request, next: Next) -> Result<Response, Rejection> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Missing access token")))?;

    if !claims.is_staff() {
        warn!("Account {} tried a staff-only route", claims.account_id());
        return Err(service_error_to_http(ServiceError::permission_denied(
            "Staff account required",
        )));
    }

    Ok(next.run(request).await)
}

/// Customer authorization middleware; expects `jwt_auth` to have run first.
/// Staff accounts have no cart or orders of their own.
pub async fn user_auth(request: Request, next: Next) -> Result<Response, Rejection> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| service_error_to_http(ServiceError::unauthorized("Missing access token")))?;

    if claims.is_staff() {
        warn!("Staff account {} tried a customer route", claims.account_id());
        return Err(service_error_to_http(ServiceError::permission_denied(
            "User account required",
        )));
    }

    Ok(next.run(request).await)
}

/// Service key check for process-to-process catalog calls
pub async fn service_key_auth(request: Request, next: Next) -> Result<Response, Rejection> {
    let state = request
        .extensions()
        .get::<AppState>()
        .ok_or_else(missing_state)?;

    let presented = request
        .headers()
        .get(SERVICE_KEY_HEADER)
        .map(|header| header.as_bytes())
        .unwrap_or_default();

    if !constant_time_eq(presented, state.config.service_key.as_bytes()) {
        warn!("Internal catalog call without a valid service key");
        return Err(service_error_to_http(ServiceError::permission_denied(
            "Invalid service key",
        )));
    }

    Ok(next.run(request).await)
}
