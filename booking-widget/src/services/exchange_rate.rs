//! USD to local-currency exchange rate with a fallback-seeded cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::ExchangeRateSettings;
use crate::error::BookingError;
use crate::models::Quote;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("exchange-rate request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("exchange-rate API returned {0}")]
    Status(u16),

    #[error("exchange-rate API reported {0}")]
    Unsuccessful(String),

    #[error("unusable exchange rate {0}")]
    InvalidRate(f64),

    #[error("cannot decode exchange-rate response: {0}")]
    Decode(String),
}

/// Source of the live rate; `ExchangeRateApiClient` in production.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rate(&self) -> Result<f64, RateError>;
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    conversion_rate: Option<f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

/// exchangerate-api.com v6 pair endpoint.
#[derive(Clone)]
pub struct ExchangeRateApiClient {
    client: Client,
    api_key: Secret<String>,
    base_url: String,
    from: String,
    to: String,
}

impl ExchangeRateApiClient {
    pub fn new(settings: &ExchangeRateSettings) -> Result<Self, RateError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            from: settings.base_currency.clone(),
            to: settings.target_currency.clone(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiClient {
    async fn fetch_rate(&self) -> Result<f64, RateError> {
        let url = format!(
            "{}/{}/pair/{}/{}",
            self.base_url,
            self.api_key.expose_secret(),
            self.from,
            self.to
        );

        // The key is part of the path, so reqwest errors are stripped of
        // their URL before they can reach a log line.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Transport(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body: PairResponse = response
            .json()
            .await
            .map_err(|e| RateError::Decode(e.without_url().to_string()))?;

        if body.result != "success" {
            return Err(RateError::Unsuccessful(
                body.error_type.unwrap_or(body.result),
            ));
        }

        let rate = body
            .conversion_rate
            .ok_or_else(|| RateError::Decode("missing conversion_rate".to_string()))?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RateError::InvalidRate(rate));
        }
        Ok(rate)
    }
}

/// Cached rate. `fetched_at` stays `None` while the fallback is in use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate {
    pub rate: f64,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct Cached {
    value: ExchangeRate,
    last_attempt: Option<Instant>,
}

/// Process-wide rate cache. Readers never wait on a fetch; the refresh
/// routine is the only writer.
pub struct ExchangeRateCache {
    source: Arc<dyn RateSource>,
    cached: RwLock<Cached>,
    refreshing: AtomicBool,
    interval: Duration,
}

impl ExchangeRateCache {
    pub fn new(source: Arc<dyn RateSource>, fallback_rate: f64, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            cached: RwLock::new(Cached {
                value: ExchangeRate {
                    rate: fallback_rate,
                    fetched_at: None,
                },
                last_attempt: None,
            }),
            refreshing: AtomicBool::new(false),
            interval,
        })
    }

    pub fn from_settings(
        source: Arc<dyn RateSource>,
        settings: &ExchangeRateSettings,
    ) -> Arc<Self> {
        Self::new(source, settings.fallback_rate, settings.refresh_interval())
    }

    /// Cached value, possibly the fallback. A stale value schedules a
    /// background refresh without waiting for it.
    pub async fn current(self: &Arc<Self>) -> ExchangeRate {
        let cached = *self.cached.read().await;
        let stale = cached
            .last_attempt
            .map_or(true, |at| at.elapsed() >= self.interval);
        if stale {
            self.schedule_refresh();
        }
        cached.value
    }

    /// Fetch now and replace the cached value. On failure the previous value
    /// stays.
    pub async fn refresh(&self) -> Result<ExchangeRate, RateError> {
        let fetched = self.source.fetch_rate().await;

        let mut cached = self.cached.write().await;
        cached.last_attempt = Some(Instant::now());
        let rate = fetched?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RateError::InvalidRate(rate));
        }
        cached.value = ExchangeRate {
            rate,
            fetched_at: Some(Utc::now()),
        };
        tracing::info!(rate, "Exchange rate updated");
        Ok(cached.value)
    }

    /// Hourly (or configured) refresh loop. The first tick fires immediately.
    pub fn spawn_refresher(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.interval);
            loop {
                ticker.tick().await;
                cache.refresh_logged().await;
            }
        })
    }

    /// Quote a USD price at the current rate.
    pub async fn convert_usd(self: &Arc<Self>, usd: f64) -> Result<Quote, BookingError> {
        let rate = self.current().await;
        Quote::new(usd, rate.rate)
    }

    fn schedule_refresh(self: &Arc<Self>) {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            cache.refresh_logged().await;
            cache.refreshing.store(false, Ordering::Release);
        });
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Exchange rate refresh failed, keeping previous value");
        }
    }
}
