// [libs/domain/models/src/rating_result.rs]
//! RatingResult: one immutable priced line item within a cycle, keyed by
//! checksum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingSource {
    FlatRate,
    UsageEvents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingResult {
    pub id: i64,
    pub billing_cycle_id: i64,
    pub subscription_id: i64,
    pub price_id: i64,
    pub meter_id: Option<i64>,
    pub feature_code: String,
    /// For flat rows this is the proration factor, not a unit count (spec
    /// §9 open question); `amount = quantity * unit_price_cents` holds by
    /// construction for both row kinds.
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
    pub currency: Currency,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub source: RatingSource,
    pub checksum: String,
}
