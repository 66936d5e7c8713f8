use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::BookingError;

/// Display data for one apartment, keyed by its Smoobu id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Overrides the upstream nightly price when set.
    #[serde(default)]
    pub base_price_usd: Option<f64>,
}

/// Validated id → display lookup used when turning availability into offers.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    entries: HashMap<i64, RoomEntry>,
}

impl RoomCatalog {
    pub fn new(entries: Vec<RoomEntry>) -> Result<Self, BookingError> {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(BookingError::Config(format!(
                    "room {} has no display name",
                    entry.id
                )));
            }
            if let Some(price) = entry.base_price_usd {
                if !price.is_finite() || price <= 0.0 {
                    return Err(BookingError::Config(format!(
                        "room {} has invalid base price {}",
                        entry.id, price
                    )));
                }
            }
            if let Some(previous) = map.insert(entry.id, entry) {
                return Err(BookingError::Config(format!(
                    "room {} is listed more than once",
                    previous.id
                )));
            }
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, id: i64) -> Option<&RoomEntry> {
        self.entries.get(&id)
    }

    pub fn display_name(&self, id: i64) -> String {
        self.get(id)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| format!("Room {id}"))
    }

    pub fn image(&self, id: i64) -> Option<String> {
        self.get(id).and_then(|entry| entry.image.clone())
    }

    pub fn base_price(&self, id: i64) -> Option<f64> {
        self.get(id).and_then(|entry| entry.base_price_usd)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
