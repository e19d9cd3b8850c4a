//! HTTP request handlers for the tariff engine API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{CalculateRequest, OverlapValidationRequest};
use super::response::{ApiError, ApiErrorResponse, ValidationResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/validate-overlap", post(validate_overlap_handler))
        .with_state(state)
}

/// Handler for POST /calculate.
///
/// Resolves the tariff and formula for the posted route and returns the
/// calculation result.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let (request, formulas) = body.into_parts();
    let start_time = Instant::now();
    match state.engine().resolve_and_calculate(&request, &formulas) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                route_id = %result.route_id,
                tariff_id = ?result.resolved_tariff_id,
                total = %result.total,
                warnings = result.audit_trace.warnings.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => engine_error_response(correlation_id, err, "Calculation failed"),
    }
}

/// Handler for POST /validate-overlap.
///
/// Answers `{"valid": true}` when the candidate can be stored, otherwise
/// the overlap or malformed-interval error.
async fn validate_overlap_handler(
    State(state): State<AppState>,
    payload: Result<Json<OverlapValidationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing overlap validation request");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let engine = state.engine();
    let outcome = match &body {
        OverlapValidationRequest::Tariff {
            candidate,
            existing,
        } => engine.validate_tariff(candidate, existing),
        OverlapValidationRequest::Formula {
            candidate,
            existing,
        } => engine.validate_formula(candidate, existing),
    };

    match outcome {
        Ok(()) => {
            info!(
                correlation_id = %correlation_id,
                candidate_id = %body.candidate_id(),
                "Candidate validity accepted"
            );
            json_response(StatusCode::OK, ValidationResponse { valid: true })
        }
        Err(err) => engine_error_response(correlation_id, err, "Candidate validity rejected"),
    }
}

fn json_response(status: StatusCode, body: impl serde::Serialize) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn engine_error_response(correlation_id: Uuid, err: EngineError, context: &str) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "{}", context
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}
