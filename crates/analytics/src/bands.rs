use chrono::{DateTime, NaiveDate, Utc};
use core_types::{BAND_COUNT, DailyTick, TickOutcome, TimeBandRecord};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Band index for a risk value: `floor(risk * 10)` clamped to `0..=9`.
///
/// Bands are half-open `[b/10, (b+1)/10)` except the last, which also
/// contains 1.0.
pub fn band_for_risk(risk: Decimal) -> usize {
    (risk * dec!(10))
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(BAND_COUNT - 1)
}

/// Center of a band, e.g. 0.25 for band 2.
pub fn band_midpoint(band: usize) -> Decimal {
    Decimal::from(band.min(BAND_COUNT - 1)) / dec!(10) + dec!(0.05)
}

/// Applies daily observations to band records.
///
/// The tracker is stateless; persistence decides whether a date was already
/// recorded (the idempotency key is symbol + date) and tells `apply`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeBandTracker;

impl TimeBandTracker {
    pub fn new() -> Self {
        Self
    }

    /// Turns a risk/price observation into a tick for `date`.
    pub fn observe(
        &self,
        symbol: &str,
        risk: Decimal,
        price: Decimal,
        date: NaiveDate,
        run_id: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> DailyTick {
        DailyTick {
            symbol: symbol.to_string(),
            date,
            risk,
            price,
            band: band_for_risk(risk),
            recorded_at,
            run_id,
        }
    }

    /// Applies a tick to `record`.
    ///
    /// The band counter and `total_days` move only when `first_for_date` is
    /// true. The current-state fields follow the newest date seen, so
    /// replaying an older date (backfill) never rewinds them.
    pub fn apply(
        &self,
        record: &mut TimeBandRecord,
        tick: &DailyTick,
        first_for_date: bool,
    ) -> TickOutcome {
        let band = tick.band.min(BAND_COUNT - 1);

        let outcome = if first_for_date {
            record.band_counts[band] += 1;
            record.total_days += 1;
            TickOutcome::Counted
        } else {
            TickOutcome::Refreshed
        };

        let is_latest = record.last_tick_date.is_none_or(|last| tick.date >= last);
        if is_latest {
            record.current_risk = Some(tick.risk);
            record.current_price = Some(tick.price);
            record.current_band = Some(band);
            record.last_tick_date = Some(tick.date);
            record.last_update_timestamp = Some(tick.recorded_at);
        }

        outcome
    }

    /// Replaces a record's counters with externally supplied backfill counts.
    /// Coefficients must be recomputed afterwards.
    pub fn seed(&self, record: &mut TimeBandRecord, counts: [u32; BAND_COUNT]) {
        record.band_counts = counts;
        record.total_days = counts.iter().sum();
    }
}
