// [libs/domain/models/src/subscription_item.rs]
//! SubscriptionItem: attaches a subscription to a price, snapshotting
//! display fields at attach time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingMode {
    Flat,
    Metered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: i64,
    pub subscription_id: i64,
    pub price_id: i64,
    /// Snapshotted at attach time; authoritative pricing is still resolved
    /// by time through `price_amounts`, never read back from these fields.
    pub price_code: String,
    pub meter_code: Option<String>,
    pub billing_mode: BillingMode,
    pub billing_threshold: Option<i64>,
    pub meter_id: Option<i64>,
    pub quantity: i64,
    /// Bounds during which this binding is the one in effect for its meter.
    /// `None` on either end means unbounded in that direction — most items
    /// are provisioned once and never superseded, so both are typically
    /// `None`; a plan change that rebinds a meter closes the old row's
    /// `effective_to` and opens a new row's `effective_from` at the same
    /// instant.
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl SubscriptionItem {
    pub fn is_flat(&self) -> bool {
        matches!(self.billing_mode, BillingMode::Flat)
    }

    pub fn is_metered(&self) -> bool {
        matches!(self.billing_mode, BillingMode::Metered)
    }
}
