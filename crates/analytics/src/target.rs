use crate::bands::{band_for_risk, band_midpoint};
use crate::scoring::{LONG_THRESHOLD, SHORT_THRESHOLD, base_score};
use core_types::{SignalStrength, SignalType, TargetSetup, TargetSuggestion, TimeBandRecord};
use risk::RiskGrid;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Long-side bands, nearest to the neutral zone first.
const LONG_SCAN: [usize; 3] = [2, 1, 0];
/// Short-side bands, nearest to the neutral zone first.
const SHORT_SCAN: [usize; 3] = [7, 8, 9];

/// Fallback entry risks when no rarer neighbor exists.
const FALLBACK_LONG_RISK: Decimal = dec!(0.25);
const FALLBACK_SHORT_RISK: Decimal = dec!(0.75);

/// Proposes an alternate entry in a rarer band next to the current one.
///
/// Single-hop and greedy: each side returns the first scanned band that has
/// been visited, but less often than the current band. It is not a search
/// for the globally best band.
#[derive(Debug, Default, Clone, Copy)]
pub struct TargetFinder;

impl TargetFinder {
    pub fn new() -> Self {
        Self
    }

    pub fn find(
        &self,
        record: &TimeBandRecord,
        risk: Decimal,
        strength: SignalStrength,
        grid: &RiskGrid,
    ) -> TargetSuggestion {
        let current_days = record.band_counts[band_for_risk(risk)];

        let mut setups = Vec::with_capacity(2);
        if risk > LONG_THRESHOLD {
            setups.extend(self.scan(record, &LONG_SCAN, SignalType::Long, current_days, grid));
        }
        if risk < SHORT_THRESHOLD {
            setups.extend(self.scan(record, &SHORT_SCAN, SignalType::Short, current_days, grid));
        }

        if !setups.is_empty() {
            TargetSuggestion::Setups { setups }
        } else if strength.is_actionable() {
            TargetSuggestion::AlreadyOptimal
        } else {
            TargetSuggestion::WaitForExtreme {
                long_entry_price: grid.price_at(FALLBACK_LONG_RISK),
                short_entry_price: grid.price_at(FALLBACK_SHORT_RISK),
            }
        }
    }

    fn scan(
        &self,
        record: &TimeBandRecord,
        order: &[usize],
        direction: SignalType,
        current_days: u32,
        grid: &RiskGrid,
    ) -> Option<TargetSetup> {
        let band = order.iter().copied().find(|&band| {
            let days = record.band_counts[band];
            days > 0 && days < current_days
        })?;

        let target_risk = band_midpoint(band);
        let coefficient = record.band_coefficients[band];
        Some(TargetSetup {
            direction,
            band,
            band_days: record.band_counts[band],
            target_risk,
            target_price: grid.price_at(target_risk),
            coefficient,
            target_score: base_score(target_risk) * coefficient,
        })
    }
}
