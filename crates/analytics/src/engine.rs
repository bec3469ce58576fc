use crate::bands::band_for_risk;
use crate::error::AnalyticsError;
use crate::scoring::ScoringEngine;
use crate::target::TargetFinder;
use chrono::{DateTime, Utc};
use core_types::{SignalReport, TimeBandRecord};
use risk::RiskGrid;
use rust_decimal::Decimal;

/// A stateless calculator that turns a band record into a full signal report.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {
    scoring: ScoringEngine,
    targets: TargetFinder,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores the record at its last observed risk.
    ///
    /// # Arguments
    ///
    /// * `record` - The symbol's band record, with coefficients already recomputed.
    /// * `grid` - The symbol's risk grid, used to price target setups.
    /// * `at` - Timestamp stamped onto the report.
    pub fn evaluate(
        &self,
        record: &TimeBandRecord,
        grid: &RiskGrid,
        at: DateTime<Utc>,
    ) -> Result<SignalReport, AnalyticsError> {
        let risk = record
            .current_risk
            .ok_or_else(|| AnalyticsError::NoObservation(record.symbol.clone()))?;
        Ok(self.evaluate_at(record, grid, risk, at))
    }

    /// Scores the record as if the asset were at `risk` now.
    pub fn evaluate_at(
        &self,
        record: &TimeBandRecord,
        grid: &RiskGrid,
        risk: Decimal,
        at: DateTime<Utc>,
    ) -> SignalReport {
        let band = band_for_risk(risk);
        let coefficient = record.band_coefficients[band];
        let score = self.scoring.score(risk, coefficient, at);
        let target = self
            .targets
            .find(record, risk, score.signal_strength, grid);

        SignalReport {
            symbol: record.symbol.clone(),
            risk,
            band,
            base_score: score.base_score,
            coefficient: score.coefficient,
            total_score: score.total_score,
            signal_type: score.signal_type,
            signal_strength: score.signal_strength,
            target,
            scored_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficient::CoefficientCalculator;
    use chrono::NaiveDate;
    use core_types::{GridPoint, SignalStrength, SignalType, TargetSuggestion};
    use rust_decimal_macros::dec;

    fn grid() -> RiskGrid {
        RiskGrid::new(
            "SOLUSDT",
            vec![
                GridPoint::new("SOLUSDT", dec!(10), dec!(0)),
                GridPoint::new("SOLUSDT", dec!(310), dec!(1)),
            ],
        )
        .unwrap()
    }

    fn record() -> TimeBandRecord {
        let mut record =
            TimeBandRecord::new("SOLUSDT", NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        record.band_counts = [60, 200, 261, 321, 401, 441, 261, 140, 80, 40];
        record.total_days = record.counted_days();
        CoefficientCalculator::new().apply(&mut record);
        record
    }

    #[test]
    fn record_without_observation_cannot_be_scored() {
        let err = AnalyticsEngine::new()
            .evaluate(&record(), &grid(), Utc::now())
            .unwrap_err();
        assert_eq!(err, AnalyticsError::NoObservation("SOLUSDT".to_string()));
    }

    #[test]
    fn short_zone_uses_current_band_coefficient() {
        let mut record = record();
        record.current_risk = Some(dec!(0.715));
        record.current_band = Some(7);

        let report = AnalyticsEngine::new()
            .evaluate(&record, &grid(), Utc::now())
            .unwrap();

        assert_eq!(report.band, 7);
        assert_eq!(report.base_score, dec!(60));
        assert_eq!(report.coefficient, record.band_coefficients[7]);
        assert_eq!(report.total_score, dec!(60) * record.band_coefficients[7]);
        assert_eq!(report.signal_type, SignalType::Short);
        assert_eq!(report.signal_strength, SignalStrength::Weak);
        // Only the long side is scanned. Band 7 has 140 days; of bands 2, 1, 0
        // (261, 200, 60 days) only band 0 is rarer.
        let TargetSuggestion::Setups { setups } = report.target else {
            panic!("expected a long setup");
        };
        assert_eq!(setups.len(), 1);
        assert_eq!(setups[0].band, 0);
        assert_eq!(setups[0].target_price, dec!(25));
    }

    #[test]
    fn score_record_matches_report() {
        let mut record = record();
        record.current_risk = Some(dec!(0.95));
        let at = Utc::now();

        let report = AnalyticsEngine::new().evaluate(&record, &grid(), at).unwrap();
        let score = report.score_record();

        assert_eq!(score.total_score, dec!(160));
        assert_eq!(score.signal_strength, SignalStrength::Strongest);
        assert_eq!(score.last_score_update, at);
        assert_eq!(report.target, TargetSuggestion::AlreadyOptimal);
    }
}
