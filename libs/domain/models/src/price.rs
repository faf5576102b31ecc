// [libs/domain/models/src/price.rs]
//! Price / PriceAmount: append-only, time-versioned monetary configuration
//!. A price amount is scoped to `(priceId, meterId?, currency)`
//! and is retired by setting `effective_to`, never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Currency;
use crate::window::Window;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub tenant_id: i64,
    pub product_id: i64,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAmount {
    pub id: i64,
    pub price_id: i64,
    /// `None` means this is the meter-agnostic default amount for the price.
    pub meter_id: Option<i64>,
    pub currency: Currency,
    pub unit_amount_cents: i64,
    pub minimum_cents: Option<i64>,
    pub maximum_cents: Option<i64>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl PriceAmount {
    pub fn window(&self) -> Window {
        Window::new(self.effective_from, self.effective_to)
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.window().contains_instant(at)
    }

    pub fn matches_meter(&self, meter_id: Option<i64>) -> bool {
        self.meter_id == meter_id
    }
}

/// Picks the amount effective at `at` for `(price_id, meter_id)`: a
/// meter-specific row shadows the meter-agnostic default.
pub fn resolve_amount_at<'a>(
    amounts: &'a [PriceAmount],
    price_id: i64,
    meter_id: Option<i64>,
    at: DateTime<Utc>,
) -> Option<&'a PriceAmount> {
    let specific = amounts
        .iter()
        .find(|a| a.price_id == price_id && a.meter_id == meter_id && a.covers(at));
    if specific.is_some() || meter_id.is_none() {
        return specific;
    }
    amounts
        .iter()
        .find(|a| a.price_id == price_id && a.meter_id.is_none() && a.covers(at))
}
