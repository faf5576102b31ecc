// [libs/domain/models/src/error.rs]
//! Stable error-kind contract. Validation and invariant violations
//! propagate unchanged to the caller; `Transient` is retried in place;
//! terminal business errors park the work item without mutating state.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("invalid billing cycle: {0}")]
    InvalidBillingCycle(String),

    #[error("billing cycle not found: {0}")]
    BillingCycleNotFound(i64),

    #[error("billing cycle is not in Closing status")]
    BillingCycleNotClosing,

    #[error("subscription has no items")]
    NoSubscriptionItems,

    #[error("subscription not found: {0}")]
    SubscriptionNotFound(i64),

    #[error("invalid subscription status: {0}")]
    InvalidSubscriptionStatus(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("no price amount effective for price {price_id} at the resolved instant")]
    MissingPriceAmount { price_id: i64 },

    #[error("missing customer: {0}")]
    MissingCustomer(i64),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Terminal usage-event state, not a raised error in the job-failure
    /// sense; carried here so the same enum can label batch rows.
    #[error("usage event references an unknown meter")]
    UnmatchedMeter,

    #[error("usage event matched no active subscription at the recorded instant")]
    UnmatchedSubscription,

    #[error("lease lost for job {0}")]
    LeaseLost(String),

    #[error("conflict, retry")]
    Conflict,

    #[error("transient error: {0}")]
    Transient(String),
}

impl BillingError {
    /// `Transient` errors are retried with backoff; everything else either
    /// surfaces to the caller or parks the work item.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Transient(_) | BillingError::Conflict)
    }
}
