use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::catalog::RoomCatalog;
use crate::error::BookingError;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// A bookable room for the current query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOffer {
    pub id: i64,
    pub display_name: String,
    pub nightly_price_usd: f64,
    pub currency_symbol: String,
    pub available: bool,
    pub image: Option<String>,
    pub detail: Option<RoomDetail>,
}

/// Smoobu apartment description, as returned by the room-details route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDetail {
    pub location: Location,
    pub time_zone: Option<String>,
    pub rooms: RoomConfiguration,
    pub equipments: Vec<String>,
    pub currency: Option<String>,
    pub price: Option<PriceRange>,
    #[serde(rename = "type")]
    pub kind: Option<ApartmentType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub street: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomConfiguration {
    pub max_occupancy: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub double_beds: Option<u32>,
    pub single_beds: Option<u32>,
    pub sofa_beds: Option<u32>,
    pub couches: Option<u32>,
    pub child_beds: Option<u32>,
    pub queen_size_beds: Option<u32>,
    pub king_size_beds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub minimal: Option<String>,
    pub maximal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApartmentType {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// Price entry from the availability answer. `price` stays raw so a
/// non-numeric value can be told apart from a missing one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriceEntry {
    pub price: Option<Value>,
    pub currency: Option<String>,
}

impl PriceEntry {
    pub fn numeric_price(&self) -> Option<f64> {
        self.price
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAvailability {
    available_apartments: Option<Vec<i64>>,
    prices: Option<HashMap<String, PriceEntry>>,
}

/// Availability answer: which apartments are free and what they cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    pub available_apartments: Vec<i64>,
    pub prices: HashMap<i64, PriceEntry>,
}

impl Availability {
    /// Parse the proxied Smoobu body. Both `availableApartments` and `prices`
    /// must be present.
    pub fn from_json(body: &str) -> Result<Self, BookingError> {
        let raw: RawAvailability = serde_json::from_str(body)
            .map_err(|e| BookingError::IntegrationMismatch(format!("availability body: {e}")))?;

        let (Some(available_apartments), Some(prices)) = (raw.available_apartments, raw.prices)
        else {
            return Err(BookingError::IntegrationMismatch(
                "availability answer lacks availableApartments or prices".to_string(),
            ));
        };

        let prices = prices
            .into_iter()
            .filter_map(|(key, entry)| match key.parse::<i64>() {
                Ok(id) => Some((id, entry)),
                Err(_) => {
                    tracing::warn!(key = %key, "Ignoring price entry with non-numeric apartment id");
                    None
                }
            })
            .collect();

        Ok(Self {
            available_apartments,
            prices,
        })
    }
}

/// Join the availability list with the price map. Ids without a numeric
/// price are dropped; order follows the availability list.
pub fn derive_offers(availability: &Availability, catalog: &RoomCatalog) -> Vec<RoomOffer> {
    availability
        .available_apartments
        .iter()
        .filter_map(|&id| {
            let Some(entry) = availability.prices.get(&id) else {
                tracing::warn!(apartment_id = id, "No price data for available apartment");
                return None;
            };
            let Some(upstream_price) = entry.numeric_price() else {
                tracing::warn!(apartment_id = id, "Price for available apartment is not numeric");
                return None;
            };

            Some(RoomOffer {
                id,
                display_name: catalog.display_name(id),
                nightly_price_usd: catalog.base_price(id).unwrap_or(upstream_price),
                currency_symbol: entry
                    .currency
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
                available: true,
                image: catalog.image(id),
                detail: None,
            })
        })
        .collect()
}
