//! Inbound request shapes and their boundary validation.
//!
//! Bodies are inspected as raw JSON so every problem is reported at once,
//! with the field name the caller used, instead of failing on the first
//! type mismatch during deserialization.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

/// Availability search forwarded to Smoobu's `checkApartmentAvailability`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub apartments: Vec<i64>,
    pub customer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment_id: Option<i64>,
}

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn as_iso_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn date_field(
    obj: &Map<String, Value>,
    keys: [&str; 2],
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    match keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null())) {
        None => {
            errors.add(field, field_error("required", format!("{field} is required")));
            None
        }
        Some(value) => {
            let date = as_iso_date(value);
            if date.is_none() {
                errors.add(
                    field,
                    field_error("iso8601", format!("{field} must be an ISO-8601 date")),
                );
            }
            date
        }
    }
}

impl AvailabilityRequest {
    /// Validate a raw JSON body. Dates may be sent as `arrivalDate`/`arrival`
    /// and `departureDate`/`departure`.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(obj) = body.as_object() else {
            errors.add(
                "body",
                field_error("object", "Request body must be a JSON object"),
            );
            return Err(errors);
        };

        let arrival = date_field(obj, ["arrivalDate", "arrival"], "arrivalDate", &mut errors);
        let departure = date_field(
            obj,
            ["departureDate", "departure"],
            "departureDate",
            &mut errors,
        );

        if let (Some(arrival), Some(departure)) = (arrival, departure) {
            if departure <= arrival {
                errors.add(
                    "departureDate",
                    field_error("range", "departureDate must be after arrivalDate"),
                );
            }
        }

        let apartment_id = match obj.get("apartmentId") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let id = as_integer(value);
                if id.is_none() {
                    errors.add(
                        "apartmentId",
                        field_error("integer", "apartmentId must be an integer"),
                    );
                }
                id
            }
        };

        let apartments = match obj.get("apartments") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let ids: Vec<i64> = items.iter().filter_map(as_integer).collect();
                if ids.len() != items.len() {
                    errors.add(
                        "apartments",
                        field_error("integer", "apartments must contain only integers"),
                    );
                }
                ids
            }
            Some(_) => {
                errors.add(
                    "apartments",
                    field_error("array", "apartments must be an array of integers"),
                );
                Vec::new()
            }
        };

        let customer_id = match obj.get("customerId").filter(|v| !v.is_null()) {
            None => {
                errors.add(
                    "customerId",
                    field_error("required", "customerId is required"),
                );
                None
            }
            Some(value) => match as_integer(value) {
                Some(id) if id > 0 => Some(id),
                _ => {
                    errors.add(
                        "customerId",
                        field_error("integer", "customerId must be a positive integer"),
                    );
                    None
                }
            },
        };

        match (arrival, departure, customer_id) {
            (Some(arrival_date), Some(departure_date), Some(customer_id)) if errors.errors().is_empty() => {
                Ok(Self {
                    arrival_date,
                    departure_date,
                    apartments,
                    customer_id,
                    apartment_id,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Validate the `:apartmentId` path segment of the room-details route.
pub fn parse_apartment_id(raw: &str) -> Result<i64, ValidationErrors> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "apartmentId",
                field_error("integer", "apartmentId must be a positive integer"),
            );
            Err(errors)
        }
    }
}
