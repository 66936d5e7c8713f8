use availability_proxy::config::{
    Config, CorsConfig, LogConfig, RateLimitConfig, ServerConfig, SmoobuConfig,
};
use availability_proxy::{build_router, AppState};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::net::{IpAddr, SocketAddr};
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "smoobu-test-key";
pub const TEST_CLIENT_IP: &str = "203.0.113.10";

pub struct TestApp {
    pub router: Router,
    pub smoobu: MockServer,
}

pub fn test_config(
    smoobu_url: &str,
    max_requests: u32,
    trusted_proxies: Vec<IpAddr>,
) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        smoobu: SmoobuConfig {
            api_key: Secret::new(TEST_API_KEY.to_string()),
            base_url: smoobu_url.to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit: RateLimitConfig {
            max_requests,
            window_seconds: 900,
            trusted_proxies,
        },
        log: LogConfig {
            level: "error".to_string(),
            file: None,
        },
        service_name: "availability-proxy-test".to_string(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: serde_json::Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_limit(100).await
    }

    pub async fn spawn_with_limit(max_requests: u32) -> Self {
        Self::spawn_with(max_requests, Vec::new()).await
    }

    pub async fn spawn_with(max_requests: u32, trusted_proxies: Vec<IpAddr>) -> Self {
        let smoobu = MockServer::start().await;
        let state = AppState::new(test_config(&smoobu.uri(), max_requests, trusted_proxies))
            .expect("Failed to build app state");

        TestApp {
            router: build_router(state),
            smoobu,
        }
    }

    /// Send as if the TCP connection came from `TEST_CLIENT_IP`.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.send_from(TEST_CLIENT_IP, request).await
    }

    pub async fn send_from(&self, peer: &str, mut request: Request<Body>) -> TestResponse {
        let addr = SocketAddr::new(peer.parse().expect("Invalid peer address"), 40000);
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_availability(&self, body: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/check-availability")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}
