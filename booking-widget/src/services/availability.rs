use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::BookingError;
use crate::models::{Availability, BookingQuery, RoomDetail};

const RATE_LIMITED_FALLBACK: &str = "Too many requests, please try again later.";

/// Room availability collaborator; `ProxyClient` talks to the availability proxy.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn check_availability(&self, query: &BookingQuery) -> Result<Availability, BookingError>;

    async fn room_details(&self, apartment_id: i64) -> Result<RoomDetail, BookingError>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<Value>,
}

#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self, BookingError> {
        let client = Client::builder().timeout(Duration::from_secs(20)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Read a 2xx body as text or turn a non-2xx answer into an error.
    async fn read_body(response: reqwest::Response) -> Result<String, BookingError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Availability proxy returned an error");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BookingError::RateLimited(
                parsed
                    .error
                    .unwrap_or_else(|| RATE_LIMITED_FALLBACK.to_string()),
            ));
        }

        let message = match parsed.details {
            Some(Value::String(details)) => details,
            Some(Value::Object(map)) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(parsed.error)
                .unwrap_or_else(|| status.to_string()),
            _ => parsed.error.unwrap_or_else(|| status.to_string()),
        };

        Err(BookingError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AvailabilitySource for ProxyClient {
    async fn check_availability(&self, query: &BookingQuery) -> Result<Availability, BookingError> {
        let response = self
            .client
            .post(format!("{}/api/check-availability", self.base_url))
            .json(query)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        Availability::from_json(&body)
    }

    async fn room_details(&self, apartment_id: i64) -> Result<RoomDetail, BookingError> {
        let response = self
            .client
            .get(format!("{}/api/room-details/{}", self.base_url, apartment_id))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| BookingError::IntegrationMismatch(format!("room details: {e}")))
    }
}
