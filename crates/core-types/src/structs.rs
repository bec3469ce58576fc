use crate::enums::{SignalStrength, SignalType};
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of equal-width risk bands the `[0, 1]` risk range is split into.
pub const BAND_COUNT: usize = 10;

/// Checks a band index read from an untyped source.
pub fn band_index(raw: impl Into<i64>) -> Result<usize, CoreError> {
    let raw = raw.into();
    usize::try_from(raw)
        .ok()
        .filter(|&band| band < BAND_COUNT)
        .ok_or(CoreError::BandOutOfRange(raw))
}

/// One hand-calibrated control point of a symbol's price/risk grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub symbol: String,
    pub price: Decimal,
    pub risk: Decimal,
}

impl GridPoint {
    pub fn new(symbol: impl Into<String>, price: Decimal, risk: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            risk,
        }
    }
}

/// The per-symbol day counters and their derived rarity coefficients.
///
/// `band_counts[b]` is the number of distinct days the asset closed inside
/// risk band `b`. `band_coefficients` is always a pure function of
/// `band_counts`; it is stored only so readers do not have to recompute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBandRecord {
    pub symbol: String,
    pub total_days: u32,
    pub band_counts: [u32; BAND_COUNT],
    pub band_coefficients: [Decimal; BAND_COUNT],
    pub current_risk: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub current_band: Option<usize>,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    /// The latest calendar day a tick was applied for. The `current_*`
    /// fields always describe this day.
    pub last_tick_date: Option<NaiveDate>,
    /// The calendar day this symbol started being tracked.
    pub tracking_started_on: NaiveDate,
}

impl TimeBandRecord {
    /// Creates an empty record: no days counted, every coefficient at 1.0.
    pub fn new(symbol: impl Into<String>, tracking_started_on: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            total_days: 0,
            band_counts: [0; BAND_COUNT],
            band_coefficients: [Decimal::ONE; BAND_COUNT],
            current_risk: None,
            current_price: None,
            current_band: None,
            last_update_timestamp: None,
            last_tick_date: None,
            tracking_started_on,
        }
    }

    /// Sum of the band counters. Equals `total_days` unless the record was
    /// seeded from an external source that disagreed with itself.
    pub fn counted_days(&self) -> u32 {
        self.band_counts.iter().sum()
    }

    /// Day count of the band the asset currently sits in.
    pub fn current_band_count(&self) -> Option<u32> {
        self.current_band.map(|band| self.band_counts[band])
    }

    /// Coefficient of the band the asset currently sits in.
    pub fn current_coefficient(&self) -> Option<Decimal> {
        self.current_band.map(|band| self.band_coefficients[band])
    }
}

/// The derived score of a symbol at its current risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub base_score: Decimal,
    pub coefficient: Decimal,
    pub total_score: Decimal,
    pub signal_type: SignalType,
    pub signal_strength: SignalStrength,
    pub last_score_update: DateTime<Utc>,
}

/// A current price as reported by the external price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// One day's observation for a symbol, ready to be applied to its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTick {
    pub symbol: String,
    pub date: NaiveDate,
    pub risk: Decimal,
    pub price: Decimal,
    pub band: usize,
    pub recorded_at: DateTime<Utc>,
    /// The run that produced this observation.
    pub run_id: Uuid,
}

/// A historical candle, used to backfill band counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
    pub interval: String,
}

/// A suggested entry in a rarer neighboring band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSetup {
    pub direction: SignalType,
    pub band: usize,
    pub band_days: u32,
    pub target_risk: Decimal,
    pub target_price: Decimal,
    pub coefficient: Decimal,
    pub target_score: Decimal,
}

/// What the target search proposes for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSuggestion {
    /// One or two rarer neighbor setups, long side first.
    Setups { setups: Vec<TargetSetup> },
    /// No rarer neighbor exists and the current signal is already strong.
    AlreadyOptimal,
    /// No rarer neighbor exists: wait for price to reach either extreme.
    WaitForExtreme {
        long_entry_price: Decimal,
        short_entry_price: Decimal,
    },
}

/// The full answer to "what is the signal for this symbol right now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub symbol: String,
    pub risk: Decimal,
    pub band: usize,
    pub base_score: Decimal,
    pub coefficient: Decimal,
    pub total_score: Decimal,
    pub signal_type: SignalType,
    pub signal_strength: SignalStrength,
    pub target: TargetSuggestion,
    pub scored_at: DateTime<Utc>,
}

impl SignalReport {
    /// The persisted, target-free part of the report.
    pub fn score_record(&self) -> ScoreRecord {
        ScoreRecord {
            base_score: self.base_score,
            coefficient: self.coefficient,
            total_score: self.total_score,
            signal_type: self.signal_type,
            signal_strength: self.signal_strength,
            last_score_update: self.scored_at,
        }
    }
}
