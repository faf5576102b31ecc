// [libs/infra/db/src/mapping.rs]
//! String <-> enum conversions for columns stored as `TEXT`. Centralized so
//! every repository agrees on the same on-disk spelling.

use billing_domain_models::{
    BillingCycleType, BillingMode, CycleStatus, FeatureType, InvoiceStatus, RatingSource, SubscriptionStatus, UsageEventStatus,
};

use crate::errors::DbError;

pub fn subscription_status_to_str(s: SubscriptionStatus) -> &'static str {
    match s {
        SubscriptionStatus::Draft => "draft",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Paused => "paused",
        SubscriptionStatus::Canceled => "canceled",
        SubscriptionStatus::Ended => "ended",
    }
}

pub fn subscription_status_from_str(s: &str) -> Result<SubscriptionStatus, DbError> {
    Ok(match s {
        "draft" => SubscriptionStatus::Draft,
        "active" => SubscriptionStatus::Active,
        "paused" => SubscriptionStatus::Paused,
        "canceled" => SubscriptionStatus::Canceled,
        "ended" => SubscriptionStatus::Ended,
        other => return Err(DbError::Mapping(format!("unknown subscription status: {other}"))),
    })
}

pub fn billing_cycle_type_to_str(t: BillingCycleType) -> &'static str {
    match t {
        BillingCycleType::Daily => "daily",
        BillingCycleType::Weekly => "weekly",
        BillingCycleType::Monthly => "monthly",
    }
}

pub fn billing_cycle_type_from_str(s: &str) -> Result<BillingCycleType, DbError> {
    Ok(match s {
        "daily" => BillingCycleType::Daily,
        "weekly" => BillingCycleType::Weekly,
        "monthly" => BillingCycleType::Monthly,
        other => return Err(DbError::Mapping(format!("unknown billing cycle type: {other}"))),
    })
}

pub fn cycle_status_to_str(s: CycleStatus) -> &'static str {
    match s {
        CycleStatus::Open => "open",
        CycleStatus::Closing => "closing",
        CycleStatus::Closed => "closed",
    }
}

pub fn cycle_status_from_str(s: &str) -> Result<CycleStatus, DbError> {
    Ok(match s {
        "open" => CycleStatus::Open,
        "closing" => CycleStatus::Closing,
        "closed" => CycleStatus::Closed,
        other => return Err(DbError::Mapping(format!("unknown cycle status: {other}"))),
    })
}

pub fn usage_event_status_to_str(s: UsageEventStatus) -> &'static str {
    match s {
        UsageEventStatus::Accepted => "accepted",
        UsageEventStatus::Enriched => "enriched",
        UsageEventStatus::UnmatchedMeter => "unmatched_meter",
        UsageEventStatus::UnmatchedSubscription => "unmatched_subscription",
    }
}

pub fn usage_event_status_from_str(s: &str) -> Result<UsageEventStatus, DbError> {
    Ok(match s {
        "accepted" => UsageEventStatus::Accepted,
        "enriched" => UsageEventStatus::Enriched,
        "unmatched_meter" => UsageEventStatus::UnmatchedMeter,
        "unmatched_subscription" => UsageEventStatus::UnmatchedSubscription,
        other => return Err(DbError::Mapping(format!("unknown usage event status: {other}"))),
    })
}

pub fn billing_mode_to_str(m: BillingMode) -> &'static str {
    match m {
        BillingMode::Flat => "flat",
        BillingMode::Metered => "metered",
    }
}

pub fn billing_mode_from_str(s: &str) -> Result<BillingMode, DbError> {
    Ok(match s {
        "flat" => BillingMode::Flat,
        "metered" => BillingMode::Metered,
        other => return Err(DbError::Mapping(format!("unknown billing mode: {other}"))),
    })
}

pub fn feature_type_to_str(t: FeatureType) -> &'static str {
    match t {
        FeatureType::Boolean => "boolean",
        FeatureType::Metered => "metered",
    }
}

pub fn feature_type_from_str(s: &str) -> Result<FeatureType, DbError> {
    Ok(match s {
        "boolean" => FeatureType::Boolean,
        "metered" => FeatureType::Metered,
        other => return Err(DbError::Mapping(format!("unknown feature type: {other}"))),
    })
}

pub fn rating_source_to_str(s: RatingSource) -> &'static str {
    match s {
        RatingSource::FlatRate => "flat_rate",
        RatingSource::UsageEvents => "usage_events",
    }
}

pub fn rating_source_from_str(s: &str) -> Result<RatingSource, DbError> {
    Ok(match s {
        "flat_rate" => RatingSource::FlatRate,
        "usage_events" => RatingSource::UsageEvents,
        other => return Err(DbError::Mapping(format!("unknown rating source: {other}"))),
    })
}

pub fn invoice_status_to_str(s: InvoiceStatus) -> &'static str {
    match s {
        InvoiceStatus::Draft => "draft",
        InvoiceStatus::Finalized => "finalized",
        InvoiceStatus::Void => "void",
    }
}

pub fn invoice_status_from_str(s: &str) -> Result<InvoiceStatus, DbError> {
    Ok(match s {
        "draft" => InvoiceStatus::Draft,
        "finalized" => InvoiceStatus::Finalized,
        "void" => InvoiceStatus::Void,
        other => return Err(DbError::Mapping(format!("unknown invoice status: {other}"))),
    })
}
