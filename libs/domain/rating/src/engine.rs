// [libs/domain/rating/src/engine.rs]
//! `RunRating(cycleId)`: the rating engine's single public operation.
//! Load, rate, replace — the emitted rows are swapped in as one unit, so a
//! faithful re-run yields byte-identical checksums and amounts and a failed
//! re-run never leaves the cycle half-reset.

use std::sync::Arc;

use billing_core_idempotency::{rating_checksum, MeterPart};
use billing_core_ids::IdGenerator;
use billing_domain_models::ports::{CycleRepository, PriceRepository, RatingResultRepository, SubscriptionRepository, UsageEventRepository};
use billing_domain_models::{resolve_amount_at, BillingError, CycleStatus, RatingResult, RatingSource};

use crate::pure::{effective_window, price_amount_subwindows, rate_flat, rate_metered};

pub struct RatingEngine {
    cycles: Arc<dyn CycleRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    prices: Arc<dyn PriceRepository>,
    usage: Arc<dyn UsageEventRepository>,
    results: Arc<dyn RatingResultRepository>,
    ids: Arc<IdGenerator>,
}

impl RatingEngine {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        prices: Arc<dyn PriceRepository>,
        usage: Arc<dyn UsageEventRepository>,
        results: Arc<dyn RatingResultRepository>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        Self { cycles, subscriptions, prices, usage, results, ids }
    }

    #[tracing::instrument(skip(self), fields(cycle_id))]
    pub async fn run_rating(&self, cycle_id: i64) -> Result<Vec<RatingResult>, BillingError> {
        let cycle = self
            .cycles
            .find(cycle_id)
            .await?
            .ok_or(BillingError::BillingCycleNotFound(cycle_id))?;

        if cycle.status != CycleStatus::Closing {
            return Err(BillingError::BillingCycleNotClosing);
        }
        if cycle.period_end <= cycle.period_start {
            return Err(BillingError::InvalidBillingCycle(format!(
                "cycle {cycle_id} has period_end <= period_start"
            )));
        }

        let subscription = self
            .subscriptions
            .find(cycle.subscription_id)
            .await?
            .ok_or(BillingError::SubscriptionNotFound(cycle.subscription_id))?;

        let items = self.subscriptions.items(subscription.id).await?;
        if items.is_empty() {
            return Err(BillingError::NoSubscriptionItems);
        }

        let entitlements = self
            .subscriptions
            .entitlements_effective_in(subscription.id, cycle.period_start, cycle.period_end)
            .await?;

        let cycle_window = cycle.window();
        let sub_lifecycle = subscription.lifecycle_window();
        let cycle_duration = cycle.duration();

        let mut emitted: Vec<RatingResult> = Vec::new();

        for item in &items {
            let binding = if item.is_metered() {
                let Some(meter_id) = item.meter_id else { continue };
                entitlements.iter().find(|e| e.meter_id == Some(meter_id))
            } else {
                let product_id = self.prices.product_id_for_price(item.price_id).await?;
                entitlements.iter().find(|e| e.product_id == product_id)
            };

            // Missing entitlement at this instant: the item is silently
            // unbilled, never rejected.
            let Some(entitlement) = binding else { continue };

            let Some(base_window) = effective_window(&cycle_window, &sub_lifecycle, &entitlement.window()) else {
                continue;
            };
            let period_end = base_window.end.expect("intersected with a closed cycle window");

            let amounts = self.prices.amounts_for_price(item.price_id).await?;

            if item.is_flat() {
                let amount = resolve_amount_at(&amounts, item.price_id, None, base_window.start)
                    .ok_or(BillingError::MissingPriceAmount { price_id: item.price_id })?;
                let (factor, amount_cents) = rate_flat(&base_window, cycle_duration, amount);
                let checksum = rating_checksum(
                    cycle.id,
                    subscription.id,
                    MeterPart::Flat,
                    item.price_id,
                    &entitlement.feature_code,
                    base_window.start,
                    period_end,
                );
                emitted.push(RatingResult {
                    id: self.ids.next_id(),
                    billing_cycle_id: cycle.id,
                    subscription_id: subscription.id,
                    price_id: item.price_id,
                    meter_id: None,
                    feature_code: entitlement.feature_code.clone(),
                    quantity: factor,
                    unit_price_cents: amount.unit_amount_cents,
                    amount_cents,
                    currency: amount.currency,
                    period_start: base_window.start,
                    period_end,
                    source: RatingSource::FlatRate,
                    checksum,
                });
                continue;
            }

            let Some(meter_id) = item.meter_id else { continue };
            let subwindows = price_amount_subwindows(&base_window, &amounts, item.price_id, meter_id);

            for sw in subwindows {
                let sw_end = sw.end.expect("subwindows are always closed");
                let Some(amount) = resolve_amount_at(&amounts, item.price_id, Some(meter_id), sw.start) else {
                    continue;
                };
                let quantity = self
                    .usage
                    .sum_enriched_in_window(subscription.tenant_id, subscription.id, meter_id, sw.start, sw_end)
                    .await?;
                if quantity < 0.0 {
                    return Err(BillingError::InvalidQuantity(format!(
                        "negative aggregated usage for meter {meter_id} in [{}, {})",
                        sw.start, sw_end
                    )));
                }
                let amount_cents = rate_metered(quantity, amount);
                let checksum = rating_checksum(
                    cycle.id,
                    subscription.id,
                    MeterPart::Meter(meter_id),
                    item.price_id,
                    &entitlement.feature_code,
                    sw.start,
                    sw_end,
                );
                emitted.push(RatingResult {
                    id: self.ids.next_id(),
                    billing_cycle_id: cycle.id,
                    subscription_id: subscription.id,
                    price_id: item.price_id,
                    meter_id: Some(meter_id),
                    feature_code: entitlement.feature_code.clone(),
                    quantity,
                    unit_price_cents: amount.unit_amount_cents,
                    amount_cents,
                    currency: amount.currency,
                    period_start: sw.start,
                    period_end: sw_end,
                    source: RatingSource::UsageEvents,
                    checksum,
                });
            }
        }

        // Replace-not-append: the reset and the new rows land in one
        // transaction, so a mid-loop failure above never reaches here and
        // a successful run is the only thing ever committed.
        self.results.replace_all(cycle_id, &emitted).await?;

        tracing::info!(cycle_id, rows = emitted.len(), "rating completed");
        Ok(emitted)
    }
}
