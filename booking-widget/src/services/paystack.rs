//! Paystack payment gateway client.
//!
//! Mobile-money charges, hosted-page card checkout and transaction
//! verification. The gateway owns all transaction state; this client only
//! forwards calls with the secret key attached.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::PaystackSettings;
use crate::models::{MinorUnits, MobileMoneyProvider, TransactionStatus};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Paystack returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Paystack request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// `status: false` in an otherwise successful answer.
    #[error("Paystack declined the request: {0}")]
    Declined(String),

    #[error("unexpected Paystack response: {0}")]
    Mismatch(String),

    #[error("Paystack secret key not configured")]
    NotConfigured,
}

/// Charge accepted by the gateway; the customer confirms on their phone.
#[derive(Debug, Clone, PartialEq)]
pub struct MobileMoneyCharge {
    pub reference: String,
    pub status: String,
    pub message: String,
    pub display_text: Option<String>,
}

/// Hosted payment page to send the browser to.
#[derive(Debug, Clone, PartialEq)]
pub struct CardCheckout {
    pub authorization_url: String,
    pub reference: String,
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: MinorUnits,
    pub currency: Option<String>,
    pub gateway_response: Option<String>,
}

/// Payment collaborator seam; `PaystackClient` is the production implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge_mobile_money(
        &self,
        email: &str,
        amount: MinorUnits,
        phone: &str,
        provider: MobileMoneyProvider,
    ) -> Result<MobileMoneyCharge, GatewayError>;

    async fn initialize_card_payment(
        &self,
        email: &str,
        amount: MinorUnits,
    ) -> Result<CardCheckout, GatewayError>;

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError>;
}

#[derive(Debug, Serialize)]
struct MobileMoneyDetails<'a> {
    phone: &'a str,
    provider: MobileMoneyProvider,
}

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    email: &'a str,
    amount: MinorUnits,
    mobile_money: MobileMoneyDetails<'a>,
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: MinorUnits,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
}

/// Every Paystack answer is wrapped in `{status, message, data}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    reference: Option<String>,
    #[serde(default)]
    status: String,
    display_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: Option<String>,
    reference: Option<String>,
    access_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    reference: Option<String>,
    status: Option<String>,
    amount: Option<u64>,
    currency: Option<String>,
    gateway_response: Option<String>,
}

#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    secret_key: Secret<String>,
    base_url: String,
    callback_url: Option<String>,
    currency: Option<String>,
}

impl PaystackClient {
    pub fn new(settings: &PaystackSettings) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            secret_key: settings.secret_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            callback_url: settings.callback_url.clone(),
            currency: settings.currency.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.expose_secret().is_empty()
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(GatewayError::NotConfigured)
        }
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<(String, T), GatewayError> {
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, operation, "Paystack response");

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .map(|e| e.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{operation} failed"));
            tracing::error!(
                status = %status,
                operation,
                message = %message,
                "Paystack request failed"
            );
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Mismatch(format!("{operation}: {e}")))?;

        if !envelope.status {
            tracing::warn!(operation, message = %envelope.message, "Paystack declined request");
            return Err(GatewayError::Declined(envelope.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Mismatch(format!("{operation}: missing data")))?;

        Ok((envelope.message, data))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn charge_mobile_money(
        &self,
        email: &str,
        amount: MinorUnits,
        phone: &str,
        provider: MobileMoneyProvider,
    ) -> Result<MobileMoneyCharge, GatewayError> {
        self.ensure_configured()?;

        let request = ChargeRequest {
            email,
            amount,
            mobile_money: MobileMoneyDetails { phone, provider },
        };

        let response = self
            .client
            .post(format!("{}/charge", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let (message, data): (String, ChargeData) =
            Self::read_envelope(response, "charge").await?;

        let reference = data
            .reference
            .filter(|r| !r.is_empty())
            .ok_or_else(|| GatewayError::Mismatch("charge: missing reference".to_string()))?;

        tracing::info!(
            reference = %reference,
            amount = amount.0,
            provider = provider.code(),
            "Mobile money charge initiated"
        );

        Ok(MobileMoneyCharge {
            reference,
            status: data.status,
            message,
            display_text: data.display_text,
        })
    }

    async fn initialize_card_payment(
        &self,
        email: &str,
        amount: MinorUnits,
    ) -> Result<CardCheckout, GatewayError> {
        self.ensure_configured()?;

        let request = InitializeRequest {
            email,
            amount,
            callback_url: self.callback_url.as_deref(),
            currency: self.currency.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let (_, data): (String, InitializeData) =
            Self::read_envelope(response, "transaction/initialize").await?;

        match (data.authorization_url, data.reference) {
            (Some(authorization_url), Some(reference)) => {
                tracing::info!(reference = %reference, amount = amount.0, "Card checkout created");
                Ok(CardCheckout {
                    authorization_url,
                    reference,
                    access_code: data.access_code,
                })
            }
            _ => Err(GatewayError::Mismatch(
                "transaction/initialize: missing authorization_url or reference".to_string(),
            )),
        }
    }

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        self.ensure_configured()?;

        let url = format!(
            "{}/transaction/verify/{}",
            self.base_url,
            urlencoding::encode(reference)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let (_, data): (String, VerifyData) =
            Self::read_envelope(response, "transaction/verify").await?;

        let status = data
            .status
            .ok_or_else(|| GatewayError::Mismatch("transaction/verify: missing status".to_string()))?;

        let verification = Verification {
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            status: TransactionStatus::from(status.as_str()),
            amount: MinorUnits(data.amount.unwrap_or(0)),
            currency: data.currency,
            gateway_response: data.gateway_response,
        };

        tracing::info!(
            reference = %verification.reference,
            status = %status,
            "Payment verified"
        );

        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str) -> PaystackSettings {
        PaystackSettings {
            secret_key: Secret::new(secret.to_string()),
            base_url: "https://api.paystack.co/".to_string(),
            callback_url: None,
            currency: None,
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(PaystackClient::new(&settings("sk_test_123")).unwrap().is_configured());
        assert!(!PaystackClient::new(&settings("")).unwrap().is_configured());
    }

    #[test]
    fn charge_request_uses_minor_units_and_provider_code() {
        let request = ChargeRequest {
            email: "guest@example.com",
            amount: MinorUnits(50050),
            mobile_money: MobileMoneyDetails {
                phone: "0551234987",
                provider: MobileMoneyProvider::Mtn,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "email": "guest@example.com",
                "amount": 50050,
                "mobile_money": { "phone": "0551234987", "provider": "mtn" }
            })
        );
    }

    #[tokio::test]
    async fn unconfigured_client_makes_no_calls() {
        let client = PaystackClient::new(&settings("")).unwrap();
        let err = client.verify("r1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
    }
}
