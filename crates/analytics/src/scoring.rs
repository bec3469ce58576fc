use chrono::{DateTime, Utc};
use core_types::{ScoreRecord, SignalStrength, SignalType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Risk at or below which the signal is LONG.
pub const LONG_THRESHOLD: Decimal = dec!(0.35);
/// Risk at or above which the signal is SHORT.
pub const SHORT_THRESHOLD: Decimal = dec!(0.65);

/// Zone score of a risk value: 100 at the extremes, 50 in the middle.
///
/// | risk                         | score |
/// |------------------------------|-------|
/// | `[0, 0.15]` or `[0.85, 1]`   | 100   |
/// | `(0.15, 0.25]` or `[0.75, 0.85)` | 80 |
/// | `(0.25, 0.35]` or `[0.65, 0.75)` | 60 |
/// | `(0.35, 0.65)`               | 50    |
pub fn base_score(risk: Decimal) -> Decimal {
    if risk <= dec!(0.15) || risk >= dec!(0.85) {
        dec!(100)
    } else if risk <= dec!(0.25) || risk >= dec!(0.75) {
        dec!(80)
    } else if risk <= LONG_THRESHOLD || risk >= SHORT_THRESHOLD {
        dec!(60)
    } else {
        dec!(50)
    }
}

pub fn signal_type(risk: Decimal) -> SignalType {
    if risk <= LONG_THRESHOLD {
        SignalType::Long
    } else if risk >= SHORT_THRESHOLD {
        SignalType::Short
    } else {
        SignalType::Neutral
    }
}

pub fn signal_strength(total_score: Decimal) -> SignalStrength {
    if total_score >= dec!(150) {
        SignalStrength::Strongest
    } else if total_score >= dec!(120) {
        SignalStrength::Strong
    } else if total_score >= dec!(90) {
        SignalStrength::Moderate
    } else {
        SignalStrength::Weak
    }
}

/// Combines the zone score with the current band's coefficient.
///
/// A pure function of `(risk, coefficient)`: no hidden state, so the same
/// inputs always produce the same record (apart from the timestamp passed in).
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, risk: Decimal, coefficient: Decimal, at: DateTime<Utc>) -> ScoreRecord {
        let base = base_score(risk);
        let total = base * coefficient;
        ScoreRecord {
            base_score: base,
            coefficient,
            total_score: total,
            signal_type: signal_type(risk),
            signal_strength: signal_strength(total),
            last_score_update: at,
        }
    }
}
