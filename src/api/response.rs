//! Response types for the tariff engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Body returned when a candidate record passes the overlap gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Always `true`; failures are reported as an `ApiError`.
    pub valid: bool,
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { path } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            ),
            EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration parse error", message),
            ),
            EngineError::TariffNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "TARIFF_NOT_FOUND",
                    message,
                    "No tariff record is valid for the route, kind and billing date",
                ),
            ),
            EngineError::ExplicitTariffNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("TARIFF_NOT_FOUND", message),
            ),
            EngineError::OverlapConflict { conflicting_id, .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "OVERLAP_CONFLICT",
                    message,
                    format!("Conflicting record: {}", conflicting_id),
                ),
            ),
            EngineError::MissingDistance { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "MISSING_DISTANCE",
                    message,
                    "Distance-based tariffs require the route's distance_km",
                ),
            ),
            EngineError::MalformedInterval { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("MALFORMED_INTERVAL", message),
            ),
            EngineError::AmountOverflow { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "AMOUNT_OVERFLOW",
                    message,
                    "The tariff values and quantity produce an amount out of range",
                ),
            ),
            // Internal only: formula failures become fallback warnings in the
            // calculator, so no handler currently surfaces this arm.
            EngineError::Evaluation { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("EVALUATION_ERROR", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}
