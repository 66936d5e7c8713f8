use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};

use super::ClientIpResolver;
use crate::error::AppError;

/// Message sent back when a caller exceeds its window.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Rate limiter keyed by IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Create a keyed rate limiter allowing `attempts` requests per `window_seconds` per IP.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let window = Duration::from_secs(window_seconds.max(1));
    let period = window / attempts.get();
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(attempts))
        .allow_burst(attempts);

    Arc::new(RateLimiter::dashmap(quota))
}

/// Limiter plus the policy deciding which address a request is charged to.
#[derive(Clone)]
pub struct IpRateLimit {
    pub limiter: IpRateLimiter,
    pub resolver: ClientIpResolver,
}

/// Middleware for IP-based rate limiting. Rejected requests never reach the handler.
pub async fn ip_rate_limit_middleware(
    State(rate_limit): State<IpRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match rate_limit.resolver.resolve(&request) {
        Some(ip) => match rate_limit.limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(
                    ip = %ip,
                    path = %request.uri().path(),
                    retry_after_secs = wait_time.as_secs(),
                    "Rate limit exceeded"
                );
                Err(AppError::TooManyRequests(
                    RATE_LIMIT_MESSAGE.to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
