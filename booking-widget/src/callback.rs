//! Resuming a card payment when the hosted page redirects back.

use serde::Deserialize;
use std::time::Duration;

use crate::models::TransactionStatus;
use crate::services::PaymentGateway;

/// How long the confirmation is shown before redirecting onwards.
pub const CONFIRMATION_REDIRECT_DELAY: Duration = Duration::from_secs(3);

pub const MISSING_REFERENCE: &str = "Missing payment reference";
pub const CALLBACK_VERIFICATION_FAILED: &str =
    "Payment verification failed. Please contact support.";
pub const CALLBACK_ERROR: &str =
    "An error occurred while verifying your payment. Please contact support.";

/// Query parameters the gateway appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        serde_urlencoded::from_str(query.trim_start_matches('?')).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unreadable payment callback query");
            Self::default()
        })
    }

    fn reference(&self) -> Option<&str> {
        match (self.reference.as_deref(), self.trxref.as_deref()) {
            (Some(reference), Some(trxref)) if !reference.is_empty() && !trxref.is_empty() => {
                Some(reference)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub reference: String,
    /// Major units (minor / 100).
    pub amount: f64,
    pub currency: Option<String>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Confirmed(Confirmation),
    Failed(String),
}

impl CallbackOutcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            CallbackOutcome::Confirmed(_) => None,
            CallbackOutcome::Failed(message) => Some(message),
        }
    }
}

pub async fn resolve_payment_callback(
    gateway: &dyn PaymentGateway,
    params: &CallbackParams,
) -> CallbackOutcome {
    let Some(reference) = params.reference() else {
        return CallbackOutcome::Failed(MISSING_REFERENCE.to_string());
    };

    match gateway.verify(reference).await {
        Ok(verification) if verification.status == TransactionStatus::Success => {
            tracing::info!(reference = %verification.reference, "Card payment confirmed");
            CallbackOutcome::Confirmed(Confirmation {
                reference: verification.reference,
                amount: verification.amount.to_major(),
                currency: verification.currency,
                status: verification.status,
            })
        }
        Ok(verification) => {
            tracing::warn!(
                reference = %verification.reference,
                status = ?verification.status,
                gateway_response = ?verification.gateway_response,
                "Card payment not successful"
            );
            CallbackOutcome::Failed(CALLBACK_VERIFICATION_FAILED.to_string())
        }
        Err(e) => {
            tracing::error!(reference, error = %e, "Card payment verification errored");
            CallbackOutcome::Failed(CALLBACK_ERROR.to_string())
        }
    }
}
