use core_types::{BAND_COUNT, TimeBandRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Coefficient of the most-visited band.
pub const MIN_COEFFICIENT: Decimal = dec!(1.0);
/// Coefficient of the least-visited (nonzero) band.
pub const MAX_COEFFICIENT: Decimal = dec!(1.6);

/// Derives per-band rarity coefficients from day counts.
///
/// Always a full recompute from `band_counts`; the previous coefficients are
/// never read.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoefficientCalculator;

impl CoefficientCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Linear map of each nonzero band's days onto `[1.0, 1.6]`, rarest band
    /// highest. Empty bands, and every band when all nonzero counts tie, get 1.0.
    pub fn compute(&self, counts: &[u32; BAND_COUNT]) -> [Decimal; BAND_COUNT] {
        let mut coefficients = [MIN_COEFFICIENT; BAND_COUNT];

        let visited = || counts.iter().copied().filter(|&days| days > 0);
        let (Some(min_days), Some(max_days)) = (visited().min(), visited().max()) else {
            return coefficients;
        };
        if min_days == max_days {
            return coefficients;
        }

        let spread = MAX_COEFFICIENT - MIN_COEFFICIENT;
        let range = Decimal::from(max_days - min_days);
        for (coefficient, &days) in coefficients.iter_mut().zip(counts) {
            if days > 0 {
                *coefficient = MAX_COEFFICIENT - Decimal::from(days - min_days) * spread / range;
            }
        }
        coefficients
    }

    /// Recomputes `record.band_coefficients`. Returns true if any value changed.
    pub fn apply(&self, record: &mut TimeBandRecord) -> bool {
        let fresh = self.compute(&record.band_counts);
        let changed = fresh != record.band_coefficients;
        record.band_coefficients = fresh;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HISTORY: [u32; BAND_COUNT] = [60, 200, 261, 321, 401, 441, 261, 140, 80, 40];

    #[test]
    fn most_and_least_visited_bands_hit_the_bounds() {
        let coefficients = CoefficientCalculator::new().compute(&HISTORY);
        assert_eq!(coefficients[5], dec!(1.0));
        assert_eq!(coefficients[9], dec!(1.6));
    }

    #[test]
    fn intermediate_band_is_linear_in_days() {
        let coefficients = CoefficientCalculator::new().compute(&HISTORY);
        // 1.6 - (140 - 40) * 0.6 / (441 - 40)
        let expected = dec!(1.6) - dec!(100) * dec!(0.6) / dec!(401);
        assert_eq!(coefficients[7], expected);
        assert!((coefficients[7] - dec!(1.450)).abs() < dec!(0.001));
    }

    #[test]
    fn every_coefficient_is_within_bounds() {
        let coefficients = CoefficientCalculator::new().compute(&HISTORY);
        for c in coefficients {
            assert!(c >= MIN_COEFFICIENT && c <= MAX_COEFFICIENT, "{c} out of bounds");
        }
    }

    #[test]
    fn rarer_bands_never_score_lower() {
        let coefficients = CoefficientCalculator::new().compute(&HISTORY);
        for a in 0..BAND_COUNT {
            for b in 0..BAND_COUNT {
                if HISTORY[a] < HISTORY[b] {
                    assert!(coefficients[a] >= coefficients[b]);
                }
            }
        }
    }

    #[test]
    fn empty_bands_default_to_one() {
        let counts = [0, 0, 10, 0, 30, 0, 0, 0, 0, 0];
        let coefficients = CoefficientCalculator::new().compute(&counts);
        assert_eq!(coefficients[0], dec!(1.0));
        assert_eq!(coefficients[2], dec!(1.6));
        assert_eq!(coefficients[4], dec!(1.0));
        assert_eq!(coefficients[9], dec!(1.0));
    }

    #[test]
    fn tied_counts_are_all_one() {
        let counts = [0, 7, 7, 0, 7, 0, 0, 0, 0, 7];
        let coefficients = CoefficientCalculator::new().compute(&counts);
        assert!(coefficients.iter().all(|c| *c == dec!(1.0)));

        let coefficients = CoefficientCalculator::new().compute(&[0; BAND_COUNT]);
        assert!(coefficients.iter().all(|c| *c == dec!(1.0)));
    }

    #[test]
    fn apply_reports_changes() {
        let calculator = CoefficientCalculator::new();
        let mut record =
            TimeBandRecord::new("BTCUSDT", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        record.band_counts = HISTORY;

        assert!(calculator.apply(&mut record));
        assert!(!calculator.apply(&mut record));
        assert_eq!(record.band_coefficients[9], dec!(1.6));
    }
}
