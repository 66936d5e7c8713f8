pub mod access_log;
pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod request_id;

use axum::extract::{ConnectInfo, Request};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

pub use access_log::access_log_middleware;
pub use metrics::metrics_middleware;
pub use rate_limit::{IpRateLimit, IpRateLimiter, create_ip_rate_limiter, ip_rate_limit_middleware};
pub use security_headers::security_headers_middleware;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

/// Decides which address identifies the caller.
///
/// The socket peer is authoritative. `X-Forwarded-For` is only consulted when
/// the peer is one of the trusted proxies, and then the right-most hop that is
/// not itself a trusted proxy wins, so a client cannot pick its own key by
/// prepending entries.
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_proxies: Arc<Vec<IpAddr>>,
}

impl ClientIpResolver {
    pub fn new(trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            trusted_proxies: Arc::new(trusted_proxies),
        }
    }

    pub fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.contains(ip)
    }

    pub fn resolve(&self, request: &Request) -> Option<IpAddr> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())?;

        if !self.is_trusted(&peer) {
            return Some(peer);
        }

        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| {
                raw.rsplit(',')
                    .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
                    .find(|hop| !self.is_trusted(hop))
            });

        Some(forwarded.unwrap_or(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_from(peer: &str, forwarded_for: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/check-availability");
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn untrusted_peer_ignores_forwarded_header() {
        let resolver = ClientIpResolver::default();
        let request = request_from("203.0.113.7", Some("10.0.0.1"));
        assert_eq!(resolver.resolve(&request), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn trusted_proxy_uses_right_most_untrusted_hop() {
        let resolver = ClientIpResolver::new(vec!["127.0.0.1".parse().unwrap()]);
        let request = request_from("127.0.0.1", Some("10.9.9.9, 198.51.100.2, 127.0.0.1"));
        assert_eq!(resolver.resolve(&request), Some("198.51.100.2".parse().unwrap()));
    }

    #[test]
    fn trusted_proxy_without_header_falls_back_to_peer() {
        let resolver = ClientIpResolver::new(vec!["127.0.0.1".parse().unwrap()]);
        let request = request_from("127.0.0.1", None);
        assert_eq!(resolver.resolve(&request), Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn missing_peer_is_unknown() {
        let request = Request::builder()
            .header("x-forwarded-for", "10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(ClientIpResolver::default().resolve(&request), None);
    }
}
