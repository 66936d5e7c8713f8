//! Application startup and lifecycle management.

use crate::config::Config;
use crate::handlers;
use crate::services::{init_metrics, SmoobuClient};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    access_log_middleware, create_ip_rate_limiter, ip_rate_limit_middleware,
    metrics_middleware, request_id_middleware, security_headers_middleware, ClientIpResolver,
    IpRateLimit,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub smoobu: SmoobuClient,
    pub client_ip: ClientIpResolver,
    pub rate_limit: IpRateLimit,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let smoobu = SmoobuClient::new(config.smoobu.clone()).map_err(|e| {
            tracing::error!("Failed to build Smoobu client: {}", e);
            AppError::ConfigError(e.into())
        })?;

        let client_ip = ClientIpResolver::new(config.rate_limit.trusted_proxies.clone());
        let rate_limit = IpRateLimit {
            limiter: create_ip_rate_limiter(
                config.rate_limit.max_requests,
                config.rate_limit.window_seconds,
            ),
            resolver: client_ip.clone(),
        };

        Ok(Self {
            config,
            smoobu,
            client_ip,
            rate_limit,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the HTTP router. Only `/api/*` routes are rate limited.
pub fn build_router(state: AppState) -> Router {
    init_metrics();

    let api = Router::new()
        .route(
            "/api/check-availability",
            post(handlers::availability::check_availability),
        )
        .route(
            "/api/room-details/:apartment_id",
            get(handlers::availability::room_details),
        )
        .layer(from_fn_with_state(
            state.rate_limit.clone(),
            ip_rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .merge(api)
        .layer(from_fn_with_state(
            state.client_ip.clone(),
            access_log_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Bind the listener (port 0 picks a random port) and assemble the router.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid listen address: {}", e))
            })?;

        let state = AppState::new(config)?;
        let router = build_router(state);

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Availability proxy listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
