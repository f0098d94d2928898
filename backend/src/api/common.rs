//! Error handling utilities for API responses.
//!
//! Provides structured error responses and conversion between service-layer errors
//! and HTTP responses. Includes:
//! - Standard response envelope
//! - ServiceError to HTTP status code mapping
//! - Validation error formatting helpers
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//! - `error.details`: Optional field-specific validation errors

use crate::errors::ServiceError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Plain acknowledgement body, `{"status": "ok"}`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: String,
}

impl StatusOk {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with default message
    pub fn ok(data: T) -> Self {
        Self::success(data, "Request successful")
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Machine-readable name of an error category
pub fn error_type(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::Validation { .. } => "validation_error",
        ServiceError::Unauthorized { .. } => "unauthorized",
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::AlreadyExists { .. } => "already_exists",
        ServiceError::Expired { .. } => "expired",
        ServiceError::AlreadyFinished { .. } => "already_finished",
        ServiceError::PermissionDenied { .. } => "permission_denied",
        ServiceError::InvalidOperation { .. } => "invalid_operation",
        ServiceError::Database { .. } => "database_error",
        ServiceError::ExternalService { .. } => "external_service_error",
        ServiceError::InternalError { .. } => "internal_error",
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> (StatusCode, String) {
    let error_type = error_type(&error);
    let (status, message) = match error {
        ServiceError::Validation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            format!("{} '{}' already exists", entity, identifier),
        ),
        ServiceError::Expired { entity } => {
            (StatusCode::BAD_REQUEST, format!("{} has expired", entity))
        }
        ServiceError::AlreadyFinished { order_id } => (
            StatusCode::CONFLICT,
            format!("Order {} is already finished", order_id),
        ),
        ServiceError::PermissionDenied { message } => (StatusCode::FORBIDDEN, message),
        ServiceError::InvalidOperation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        ServiceError::ExternalService { message } => {
            tracing::error!("External service error: {}", message);
            (StatusCode::BAD_GATEWAY, message)
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    error_body(status, message, error_type, None)
}

/// Formats validator::ValidationErrors into field-specific error details
pub fn validation_errors_to_field_errors(errors: validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .unwrap_or(&"Invalid value".into())
                    .to_string(),
            })
        })
        .collect()
}

/// Helper to create validation error response
pub fn validation_error_response(errors: validator::ValidationErrors) -> (StatusCode, String) {
    let field_errors = validation_errors_to_field_errors(errors);
    error_body(
        StatusCode::BAD_REQUEST,
        "Validation failed".to_string(),
        "validation_error",
        Some(field_errors),
    )
}

/// Validates a request body, producing the standard 400 response on failure
pub fn validate_request<T: Validate>(payload: &T) -> Result<(), (StatusCode, String)> {
    payload.validate().map_err(validation_error_response)
}

fn error_body(
    status: StatusCode,
    message: String,
    error_type: &str,
    details: Option<Vec<FieldError>>,
) -> (StatusCode, String) {
    let error_response = ApiResponse::<()>::error(message, error_type, details);
    let body = serde_json::to_string(&error_response)
        .unwrap_or_else(|_| format!("{{\"success\":false,\"message\":\"{}\"}}", error_type));
    (status, body)
}
