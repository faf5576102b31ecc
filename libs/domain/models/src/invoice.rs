// [libs/domain/models/src/invoice.rs]
//! Invoice: minimal shape the pipeline needs to gate subscription End and
//! to drive the `invoice` job. PDF/email delivery and payment are external
//! collaborators and are not modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Finalized,
    Void,
}

impl InvoiceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Finalized | InvoiceStatus::Void)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub subscription_id: i64,
    pub billing_cycle_id: i64,
    pub status: InvoiceStatus,
    pub total_cents: i64,
    pub currency: Currency,
    pub finalized_at: Option<DateTime<Utc>>,
}
