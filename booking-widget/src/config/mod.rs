use secrecy::Secret;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::BookingError;
use crate::models::{RoomCatalog, RoomEntry};

pub const DEFAULT_CUSTOMER_ID: i64 = 1107218;
pub const DEFAULT_FALLBACK_RATE: f64 = 14.3;

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetSettings {
    pub proxy: ProxySettings,
    #[serde(default)]
    pub wizard: WizardSettings,
    #[serde(default)]
    pub paystack: PaystackSettings,
    #[serde(default)]
    pub exchange_rate: ExchangeRateSettings,
    #[serde(default)]
    pub rooms: Vec<RoomEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxySettings {
    /// Base URL of the availability proxy (e.g. http://localhost:3001).
    pub base_url: String,
    #[serde(default = "default_customer_id")]
    pub customer_id: i64,
    /// Apartments every query is restricted to; empty asks about all of them.
    #[serde(default)]
    pub apartment_ids: Vec<i64>,
}

fn default_customer_id() -> i64 {
    DEFAULT_CUSTOMER_ID
}

#[derive(Debug, Deserialize, Clone)]
pub struct WizardSettings {
    /// Pause between "Payment successful!" and closing the wizard.
    #[serde(default = "default_close_delay_ms")]
    pub close_delay_ms: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            close_delay_ms: default_close_delay_ms(),
        }
    }
}

fn default_close_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaystackSettings {
    #[serde(default = "empty_secret")]
    pub secret_key: Secret<String>,
    #[serde(default = "default_paystack_url")]
    pub base_url: String,
    /// Where the hosted page sends the browser after a card payment.
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Default for PaystackSettings {
    fn default() -> Self {
        Self {
            secret_key: empty_secret(),
            base_url: default_paystack_url(),
            callback_url: None,
            currency: None,
        }
    }
}

fn default_paystack_url() -> String {
    "https://api.paystack.co".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeRateSettings {
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
    #[serde(default = "default_exchange_rate_url")]
    pub base_url: String,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
}

impl Default for ExchangeRateSettings {
    fn default() -> Self {
        Self {
            api_key: empty_secret(),
            base_url: default_exchange_rate_url(),
            base_currency: default_base_currency(),
            target_currency: default_target_currency(),
            fallback_rate: default_fallback_rate(),
            refresh_interval_seconds: default_refresh_interval_seconds(),
        }
    }
}

impl ExchangeRateSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

fn default_exchange_rate_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_target_currency() -> String {
    "GHS".to_string()
}

fn default_fallback_rate() -> f64 {
    DEFAULT_FALLBACK_RATE
}

fn default_refresh_interval_seconds() -> u64 {
    3600
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

impl WidgetSettings {
    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.wizard.close_delay_ms)
    }

    pub fn catalog(&self) -> Result<RoomCatalog, BookingError> {
        RoomCatalog::new(self.rooms.clone())
    }

    fn check(&self) -> Result<(), BookingError> {
        if self.proxy.customer_id <= 0 {
            return Err(BookingError::Config(
                "proxy.customer_id must be a positive integer".to_string(),
            ));
        }
        if let Some(id) = self.proxy.apartment_ids.iter().find(|id| **id <= 0) {
            return Err(BookingError::Config(format!(
                "proxy.apartment_ids must be positive, got {id}"
            )));
        }
        let fallback = self.exchange_rate.fallback_rate;
        if !fallback.is_finite() || fallback <= 0.0 {
            return Err(BookingError::Config(format!(
                "exchange_rate.fallback_rate must be positive, got {fallback}"
            )));
        }
        if self.exchange_rate.refresh_interval_seconds == 0 {
            return Err(BookingError::Config(
                "exchange_rate.refresh_interval_seconds must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `booking.{toml,yaml,json}` from `directory` (optional), then apply
/// `BOOKING__SECTION__KEY` environment overrides.
pub fn get_configuration(directory: &Path) -> Result<WidgetSettings, BookingError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(directory.join("booking")).required(false))
        .add_source(
            config::Environment::with_prefix("BOOKING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = settings.try_deserialize::<WidgetSettings>()?;
    settings.check()?;
    // Validate the catalog up front so a bad table fails at load time.
    let catalog = settings.catalog()?;
    tracing::info!(
        rooms = catalog.len(),
        apartments = settings.proxy.apartment_ids.len(),
        "Booking configuration loaded"
    );
    Ok(settings)
}
