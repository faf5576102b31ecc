// [libs/domain/models/src/entitlement.rs]
//! SubscriptionEntitlement: time-bounded grant of a feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Boolean,
    Metered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEntitlement {
    pub id: i64,
    pub subscription_id: i64,
    pub product_id: i64,
    pub feature_code: String,
    pub feature_type: FeatureType,
    pub meter_id: Option<i64>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl SubscriptionEntitlement {
    pub fn window(&self) -> Window {
        Window::new(self.effective_from, self.effective_to)
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.window().intersect(other).is_some()
    }
}
