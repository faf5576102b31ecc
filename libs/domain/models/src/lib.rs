// [libs/domain/models/src/lib.rs]
//! Entities, value types, and repository port traits for the billing
//! pipeline. This crate is I/O-free: no sqlx, no tokio, no tracing.
//! `libs/infra/db` implements the ports declared in [`ports`].

pub mod cycle;
pub mod entitlement;
pub mod error;
pub mod invoice;
pub mod job_lease;
pub mod meter;
pub mod money;
pub mod ports;
pub mod price;
pub mod rating_result;
pub mod subscription;
pub mod subscription_item;
pub mod usage_event;
pub mod window;

pub use cycle::{next_period_bounds, BillingCycle, CycleStatus};
pub use entitlement::{FeatureType, SubscriptionEntitlement};
pub use error::BillingError;
pub use invoice::{Invoice, InvoiceStatus};
pub use job_lease::JobLease;
pub use meter::{Aggregation, Meter};
pub use money::{clamp_amount, round_half_up, Currency, Money};
pub use price::{resolve_amount_at, Price, PriceAmount};
pub use rating_result::{RatingResult, RatingSource};
pub use subscription::{BillingCycleType, Subscription, SubscriptionStatus};
pub use subscription_item::{BillingMode, SubscriptionItem};
pub use usage_event::{SnapshotOutcome, UsageEvent, UsageEventStatus};
pub use window::Window;
