//! Access log: one structured event per request, written through the
//! tracing pipeline (stdout plus the optional append-only log file).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::time::Instant;

use super::{ClientIpResolver, REQUEST_ID_HEADER};

pub const ACCESS_LOG_TARGET: &str = "access_log";

pub async fn access_log_middleware(
    State(resolver): State<ClientIpResolver>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let timestamp = Utc::now().to_rfc3339();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = resolver
        .resolve(&req)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            target: ACCESS_LOG_TARGET,
            %timestamp, %method, %path, %ip, %request_id,
            status = status.as_u16(), latency_ms,
            "request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            target: ACCESS_LOG_TARGET,
            %timestamp, %method, %path, %ip, %request_id,
            status = status.as_u16(), latency_ms,
            "request rejected"
        );
    } else {
        tracing::info!(
            target: ACCESS_LOG_TARGET,
            %timestamp, %method, %path, %ip, %request_id,
            status = status.as_u16(), latency_ms,
            "request completed"
        );
    }

    response
}
