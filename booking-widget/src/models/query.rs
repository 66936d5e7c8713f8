use chrono::NaiveDate;
use serde::Serialize;

use crate::error::BookingError;

/// Step-one search, as sent to the availability proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    /// Empty means every apartment of the account.
    #[serde(rename = "apartments")]
    pub apartment_ids: Vec<i64>,
    pub customer_id: i64,
}

impl BookingQuery {
    /// Validate a date range against `today`: both dates not in the past and
    /// departure strictly after arrival.
    pub fn new(
        arrival_date: NaiveDate,
        departure_date: NaiveDate,
        customer_id: i64,
        today: NaiveDate,
    ) -> Result<Self, BookingError> {
        if arrival_date < today {
            return Err(BookingError::Validation(
                "Arrival date cannot be in the past.".to_string(),
            ));
        }
        if departure_date <= arrival_date {
            return Err(BookingError::Validation(
                "Departure date must be after arrival date.".to_string(),
            ));
        }
        Ok(Self {
            arrival_date,
            departure_date,
            apartment_ids: Vec::new(),
            customer_id,
        })
    }

    pub fn with_apartments(mut self, apartment_ids: Vec<i64>) -> Self {
        self.apartment_ids = apartment_ids;
        self
    }

    pub fn nights(&self) -> i64 {
        (self.departure_date - self.arrival_date).num_days()
    }
}
