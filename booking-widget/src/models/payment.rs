use serde::{Deserialize, Serialize};
use validator::Validate;

use super::money::MinorUnits;
use crate::error::BookingError;

/// Mobile-money carriers accepted by Paystack in Ghana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobileMoneyProvider {
    /// Vodafone Cash
    Vod,
    /// MTN Mobile Money
    Mtn,
    /// AirtelTigo Money
    Atl,
}

impl MobileMoneyProvider {
    pub fn code(self) -> &'static str {
        match self {
            MobileMoneyProvider::Vod => "vod",
            MobileMoneyProvider::Mtn => "mtn",
            MobileMoneyProvider::Atl => "atl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MobileMoneyProvider::Vod => "Vodafone Cash",
            MobileMoneyProvider::Mtn => "MTN Mobile Money",
            MobileMoneyProvider::Atl => "AirtelTigo Money",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    MobileMoney {
        phone: String,
        provider: MobileMoneyProvider,
    },
    Card,
}

/// Step-three form.
#[derive(Debug, Clone, Validate)]
pub struct PaymentForm {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    pub method: PaymentMethod,
}

impl PaymentForm {
    pub fn mobile_money(
        email: impl Into<String>,
        phone: impl Into<String>,
        provider: MobileMoneyProvider,
    ) -> Self {
        Self {
            email: email.into(),
            method: PaymentMethod::MobileMoney {
                phone: phone.into(),
                provider,
            },
        }
    }

    pub fn card(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            method: PaymentMethod::Card,
        }
    }

    pub fn check(&self) -> Result<(), BookingError> {
        if let Err(errors) = self.validate() {
            let message = errors
                .field_errors()
                .into_iter()
                .flat_map(|(_, errs)| errs.iter())
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Please check the payment details.".to_string());
            return Err(BookingError::Validation(message));
        }
        if let PaymentMethod::MobileMoney { phone, .. } = &self.method {
            let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
            let allowed = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'));
            if digits < 9 || !allowed {
                return Err(BookingError::Validation(
                    "Please enter a valid phone number.".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Gateway-side transaction state as reported by verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed,
    /// Anything else (`pending`, `ongoing`, `send_otp`, ...).
    Pending(String),
}

impl From<&str> for TransactionStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "success" => TransactionStatus::Success,
            "failed" => TransactionStatus::Failed,
            other => TransactionStatus::Pending(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    Success,
    Failed,
}

/// A charge the gateway has accepted and given a reference for.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAttempt {
    pub email: String,
    pub method: PaymentMethod,
    pub amount: MinorUnits,
    pub reference: String,
    pub status: AttemptStatus,
}
