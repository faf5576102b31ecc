// [libs/domain/models/src/cycle.rs]
//! BillingCycle: a half-open accrual period over a subscription. `Open -> Closing -> Closed`, never deleted.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::subscription::BillingCycleType;
use crate::window::Window;

/// Next `[periodStart, periodEnd)` following `from`, sized by `cycle_type`.
/// `ensure_cycles` anchors every cycle to the previous cycle's end (or the
/// subscription's `start_at` for the first cycle), so billing days drift
/// with calendar months rather than snapping to a fixed day-of-month.
pub fn next_period_bounds(cycle_type: BillingCycleType, from: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = match cycle_type {
        BillingCycleType::Daily => from + Duration::days(1),
        BillingCycleType::Weekly => from + Duration::days(7),
        BillingCycleType::Monthly => add_one_month(from),
    };
    (from, end)
}

fn add_one_month(at: DateTime<Utc>) -> DateTime<Utc> {
    use chrono::Datelike;
    let (year, month) = if at.month() == 12 { (at.year() + 1, 1) } else { (at.year(), at.month() + 1) };
    let days_in_target_month = days_in_month(year, month);
    let day = at.day().min(days_in_target_month);
    at.with_year(year).and_then(|d| d.with_month(month)).and_then(|d| d.with_day(day)).expect("clamped date is always valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    use chrono::Datelike;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).unwrap();
    (first_of_next - Duration::days(1)).day()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingCycle {
    pub id: i64,
    pub subscription_id: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub status: CycleStatus,
    /// Set once the Rating Engine has committed results for this cycle;
    /// `close_after_rating` gates the `Closing -> Closed` transition on it
    /// instead of re-deriving "rated" from the presence of result rows,
    /// which would be indistinguishable from a cycle with zero billable
    /// items.
    pub rated_at: Option<DateTime<Utc>>,
}

impl BillingCycle {
    pub fn window(&self) -> Window {
        Window::closed(self.period_start, self.period_end)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.period_end - self.period_start
    }

    pub fn mark_rated(&mut self, at: DateTime<Utc>) {
        self.rated_at = Some(at);
    }

    /// `Open -> Closing`, allowed once `now >= period_end`.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.status != CycleStatus::Open {
            return Err(BillingError::InvalidBillingCycle(format!(
                "cannot close cycle {} from status {:?}",
                self.id, self.status
            )));
        }
        if now < self.period_end {
            return Err(BillingError::InvalidBillingCycle(format!(
                "cycle {} period has not elapsed yet",
                self.id
            )));
        }
        self.status = CycleStatus::Closing;
        Ok(())
    }

    /// `Closing -> Closed`, allowed once the rating transaction committed.
    pub fn finish_closing(&mut self) -> Result<(), BillingError> {
        if self.status != CycleStatus::Closing {
            return Err(BillingError::BillingCycleNotClosing);
        }
        self.status = CycleStatus::Closed;
        Ok(())
    }
}
