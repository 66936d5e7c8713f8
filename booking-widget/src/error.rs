use thiserror::Error;

use crate::services::exchange_rate::RateError;
use crate::services::paystack::GatewayError;

/// Shown instead of upstream detail for any server-side failure.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const NO_ROOMS_AVAILABLE: &str = "No rooms available for the selected dates.";
pub const INVALID_RESPONSE: &str = "Invalid response from server. Please try again.";

#[derive(Debug, Error)]
pub enum BookingError {
    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),

    /// A collaborator answered with a non-2xx status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    RateLimited(String),

    /// A 2xx answer that lacks the fields the contract promises.
    #[error("unexpected response: {0}")]
    IntegrationMismatch(String),

    #[error("{}", NO_ROOMS_AVAILABLE)]
    NoRoomsAvailable,

    /// The gateway refused the request (`status: false`).
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl BookingError {
    /// Short message for the end user. Client-side problems are shown as-is;
    /// anything that originates on a server collapses to `fallback`.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            BookingError::Validation(msg) | BookingError::RateLimited(msg) => msg.clone(),
            BookingError::Upstream { status, message } if (400..500).contains(status) => {
                message.clone()
            }
            BookingError::NoRoomsAvailable => NO_ROOMS_AVAILABLE.to_string(),
            BookingError::IntegrationMismatch(_) => INVALID_RESPONSE.to_string(),
            BookingError::InvalidTransition { .. } => self.to_string(),
            BookingError::Upstream { .. }
            | BookingError::Network(_)
            | BookingError::Declined(_)
            | BookingError::Config(_) => fallback.to_string(),
        }
    }

    pub fn user_message(&self) -> String {
        self.user_message_or(GENERIC_FAILURE)
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        BookingError::Network(err.to_string())
    }
}

impl From<config::ConfigError> for BookingError {
    fn from(err: config::ConfigError) -> Self {
        BookingError::Config(err.to_string())
    }
}

impl From<GatewayError> for BookingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Upstream { status, message } => BookingError::Upstream { status, message },
            GatewayError::Network(e) => BookingError::Network(e.to_string()),
            GatewayError::Declined(message) => BookingError::Declined(message),
            GatewayError::Mismatch(message) => BookingError::IntegrationMismatch(message),
            GatewayError::NotConfigured => {
                BookingError::Config("Paystack secret key is not configured".to_string())
            }
        }
    }
}

impl From<RateError> for BookingError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Transport(e) => BookingError::Network(e.to_string()),
            RateError::Status(status) => BookingError::Upstream {
                status,
                message: "exchange-rate lookup failed".to_string(),
            },
            other => BookingError::IntegrationMismatch(other.to_string()),
        }
    }
}
