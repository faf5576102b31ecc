// [libs/domain/rating/src/pure.rs]
//! Pure rating math: window intersection, price-version sub-windowing,
//! flat/metered amount computation. No repository, no I/O — every function
//! here takes already-fetched data and is exercised directly by the tests
//! pinning a set of concrete proration scenarios.

use billing_domain_models::{clamp_amount, round_half_up, PriceAmount, Window};
use chrono::{DateTime, Utc};

/// Cycle ∩ subscription-lifecycle ∩ entitlement-window. `None` means the
/// item contributes nothing for this cycle.
pub fn effective_window(cycle: &Window, subscription_lifecycle: &Window, entitlement: &Window) -> Option<Window> {
    Window::intersect_all([cycle, subscription_lifecycle, entitlement])
}

/// Boundaries of every price-amount version touching `window`, for
/// `(price_id, meter_id)` and the meter-agnostic default of the same price,
/// plus the window's own start/end. Sorted, deduplicated.
fn price_version_boundaries(window: &Window, amounts: &[PriceAmount], price_id: i64, meter_id: i64) -> Vec<DateTime<Utc>> {
    let end = window.end.expect("effective windows are always closed once intersected with a cycle");
    let mut points = vec![window.start, end];
    for a in amounts {
        if a.price_id != price_id || !(a.meter_id == Some(meter_id) || a.meter_id.is_none()) {
            continue;
        }
        if a.effective_from > window.start && a.effective_from < end {
            points.push(a.effective_from);
        }
        if let Some(to) = a.effective_to {
            if to > window.start && to < end {
                points.push(to);
            }
        }
    }
    points.sort();
    points.dedup();
    points
}

/// Splits `window` into contiguous sub-windows at every price-version
/// boundary, so each sub-window is priced by exactly one amount row.
pub fn price_amount_subwindows(window: &Window, amounts: &[PriceAmount], price_id: i64, meter_id: i64) -> Vec<Window> {
    let points = price_version_boundaries(window, amounts, price_id, meter_id);
    points.windows(2).map(|pair| Window::closed(pair[0], pair[1])).collect()
}

/// `factor = (end - start) / cycleDuration`, clamped to `[0, 1]`; returns
/// `(factor, amount_cents)` with `amount_cents = floor(factor * unitCents + 0.5)`.
/// Flat rows are never clamped by minimum/maximum.
pub fn rate_flat(window: &Window, cycle_duration: chrono::Duration, amount: &PriceAmount) -> (f64, i64) {
    let window_seconds = window.duration().expect("flat windows are always closed").num_seconds() as f64;
    let cycle_seconds = cycle_duration.num_seconds() as f64;
    let factor = (window_seconds / cycle_seconds).clamp(0.0, 1.0);
    let amount_cents = round_half_up(factor * amount.unit_amount_cents as f64);
    (factor, amount_cents)
}

/// `raw = quantity * unitCents`, rounded half-up, then clamped to
/// `[minimum, maximum]`.
pub fn rate_metered(quantity: f64, amount: &PriceAmount) -> i64 {
    let raw = round_half_up(quantity * amount.unit_amount_cents as f64);
    clamp_amount(raw, amount.minimum_cents, amount.maximum_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_domain_models::Currency;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn flat_amount(unit_cents: i64) -> PriceAmount {
        PriceAmount {
            id: 1,
            price_id: 1,
            meter_id: None,
            currency: Currency::code("USD"),
            unit_amount_cents: unit_cents,
            minimum_cents: None,
            maximum_cents: None,
            effective_from: ts(2020, 1, 1),
            effective_to: None,
        }
    }

    #[test]
    fn mid_cycle_start_matches_spec_scenario() {
        let cycle = Window::closed(ts(2026, 1, 1), ts(2026, 2, 1));
        let window = Window::closed(ts(2026, 1, 16), ts(2026, 2, 1));
        let (factor, amount_cents) = rate_flat(&window, cycle.duration().unwrap(), &flat_amount(10_000));
        assert!((factor - 16.0 / 31.0).abs() < 1e-9);
        assert!((amount_cents - 5161).abs() <= 1);
    }

    #[test]
    fn mid_cycle_end_matches_spec_scenario() {
        let cycle = Window::closed(ts(2026, 1, 1), ts(2026, 2, 1));
        let window = Window::closed(ts(2026, 1, 1), ts(2026, 1, 16));
        let (factor, amount_cents) = rate_flat(&window, cycle.duration().unwrap(), &flat_amount(10_000));
        assert!((factor - 15.0 / 31.0).abs() < 1e-9);
        assert!((amount_cents - 4839).abs() <= 1);
    }

    #[test]
    fn metered_quantity_clamped_to_maximum() {
        let mut amount = flat_amount(100);
        amount.maximum_cents = Some(300);
        assert_eq!(rate_metered(5.0, &amount), 300);
    }

    #[test]
    fn price_amount_subwindows_split_on_version_boundary() {
        let window = Window::closed(ts(2026, 1, 1), ts(2026, 2, 1));
        let mut early = flat_amount(100);
        early.effective_to = Some(ts(2026, 1, 16));
        let mut late = flat_amount(200);
        late.effective_from = ts(2026, 1, 16);
        let subwindows = price_amount_subwindows(&window, &[early, late], 1, 9);
        assert_eq!(subwindows.len(), 2);
        assert_eq!(subwindows[0].end, Some(ts(2026, 1, 16)));
        assert_eq!(subwindows[1].start, ts(2026, 1, 16));
    }

    #[test]
    fn effective_window_empty_when_entitlement_precedes_cycle() {
        let cycle = Window::closed(ts(2026, 1, 1), ts(2026, 2, 1));
        let lifecycle = Window::new(ts(2025, 1, 1), None);
        let entitlement = Window::closed(ts(2024, 1, 1), ts(2025, 6, 1));
        assert!(effective_window(&cycle, &lifecycle, &entitlement).is_none());
    }
}
