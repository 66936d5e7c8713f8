//! HTTP handlers for availability-proxy.

pub mod availability;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;

/// Health check endpoint for liveness checks.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "availability-proxy",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
