//! Smoobu property-management API client.
//!
//! Forwards availability searches and apartment lookups with the account
//! credential attached. Response bodies are returned untouched so the proxy
//! can pass them straight through.

use crate::config::SmoobuConfig;
use crate::dtos::AvailabilityRequest;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use thiserror::Error;

const API_KEY_HEADER: &str = "Api-Key";

/// Smoobu client shared by all requests.
#[derive(Clone)]
pub struct SmoobuClient {
    client: Client,
    config: SmoobuConfig,
}

/// Successful upstream answer, body kept verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamBody {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Smoobu answered with a non-2xx status.
    #[error("Smoobu returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The request never produced a response.
    #[error("Smoobu request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Human-readable message from a Smoobu error body, falling back to the raw text.
    ///
    /// Smoobu reports problems as `{"title": ..., "detail": ...}` and
    /// validation failures as `{"validation_messages": {...}}`.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            UpstreamError::Status { body, .. } => {
                if body.trim().is_empty() {
                    return None;
                }
                match serde_json::from_str::<serde_json::Value>(body) {
                    Ok(json) => Some(
                        json.get("validation_messages")
                            .or_else(|| json.get("detail"))
                            .or_else(|| json.get("message"))
                            .or_else(|| json.get("title"))
                            .cloned()
                            .unwrap_or(json),
                    ),
                    Err(_) => Some(serde_json::Value::String(body.clone())),
                }
            }
            UpstreamError::Transport(_) => None,
        }
    }
}

impl SmoobuClient {
    /// Create a new Smoobu client.
    pub fn new(config: SmoobuConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    /// `POST /booking/checkApartmentAvailability`
    pub async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<UpstreamBody, UpstreamError> {
        let url = format!("{}/booking/checkApartmentAvailability", self.config.base_url);

        tracing::debug!(
            arrival = %request.arrival_date,
            departure = %request.departure_date,
            apartments = ?request.apartments,
            "Forwarding availability check to Smoobu"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(request)
            .send()
            .await?;

        Self::into_body(response, "checkApartmentAvailability").await
    }

    /// `GET /api/apartments/{id}`
    pub async fn get_apartment(&self, apartment_id: i64) -> Result<UpstreamBody, UpstreamError> {
        let url = format!("{}/api/apartments/{}", self.config.base_url, apartment_id);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        Self::into_body(response, "apartments").await
    }

    async fn into_body(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<UpstreamBody, UpstreamError> {
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, operation, "Smoobu response");

        if status.is_success() {
            Ok(UpstreamBody { status, body })
        } else {
            tracing::error!(
                status = %status,
                operation,
                body = %body,
                "Smoobu request failed"
            );
            Err(UpstreamError::Status { status, body })
        }
    }
}
