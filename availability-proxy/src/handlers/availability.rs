//! Proxy routes for Smoobu availability and apartment details.
//!
//! Requests are validated before any upstream call. Upstream failures keep
//! their status code; server-side failures are reduced to a generic message
//! while the full detail goes to the log.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

use crate::{
    dtos::{parse_apartment_id, AvailabilityRequest},
    services::{UpstreamBody, UpstreamError},
    AppState,
};

pub const CHECK_AVAILABILITY_FAILED: &str = "Failed to check availability";
pub const ROOM_DETAILS_FAILED: &str = "Failed to fetch room details";

fn upstream_failure(err: UpstreamError, context: &'static str) -> AppError {
    match err {
        UpstreamError::Status { status, .. } => {
            let details = err.details();
            AppError::Upstream {
                status,
                context: context.to_string(),
                details,
            }
        }
        UpstreamError::Transport(e) => {
            tracing::error!(error = %e, context, "Smoobu unreachable");
            AppError::BadGateway(format!("{}: {}", context, e))
        }
    }
}

fn pass_through(upstream: UpstreamBody) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}

/// `POST /api/check-availability`
pub async fn check_availability(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected availability request body");
        AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
    })?;

    let request = AvailabilityRequest::from_json(&body).map_err(|errors| {
        tracing::warn!(errors = %errors, "Availability request failed validation");
        AppError::from(errors)
    })?;

    tracing::info!(
        arrival = %request.arrival_date,
        departure = %request.departure_date,
        customer_id = request.customer_id,
        apartment_id = ?request.apartment_id,
        "Checking availability"
    );

    let upstream = state
        .smoobu
        .check_availability(&request)
        .await
        .map_err(|e| upstream_failure(e, CHECK_AVAILABILITY_FAILED))?;

    Ok(pass_through(upstream))
}

/// `GET /api/room-details/:apartment_id`
pub async fn room_details(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let apartment_id = parse_apartment_id(&raw_id).map_err(|errors| {
        tracing::warn!(apartment_id = %raw_id, "Rejected room details request");
        AppError::from(errors)
    })?;

    tracing::info!(apartment_id, "Fetching room details");

    let upstream = state
        .smoobu
        .get_apartment(apartment_id)
        .await
        .map_err(|e| upstream_failure(e, ROOM_DETAILS_FAILED))?;

    Ok(pass_through(upstream))
}
