// [libs/domain/models/src/meter.rs]
//! Meter: a named, tenant-scoped usage aggregation point.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meter {
    pub id: i64,
    pub tenant_id: i64,
    pub code: String,
    pub aggregation: Aggregation,
    pub unit: String,
    pub archived: bool,
}
