use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BookingError;

/// Amount in the gateway's smallest currency unit (pesewas for GHS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(pub u64);

impl MinorUnits {
    /// Round a major-unit amount to the nearest minor unit.
    pub fn from_major(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let minor = (amount * 100.0).round();
        if minor > u64::MAX as f64 {
            return None;
        }
        Some(Self(minor as u64))
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Price of the selected room in both currencies, fixed at selection time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub usd: f64,
    pub rate: f64,
    pub local: MinorUnits,
}

impl Quote {
    /// `local = round(usd * rate * 100)` minor units.
    pub fn new(usd: f64, rate: f64) -> Result<Self, BookingError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BookingError::IntegrationMismatch(format!(
                "unusable exchange rate {rate}"
            )));
        }
        let local = MinorUnits::from_major(usd * rate).ok_or_else(|| {
            BookingError::Validation(format!("Cannot charge a price of {usd} USD."))
        })?;
        Ok(Self { usd, rate, local })
    }
}
