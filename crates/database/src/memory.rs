use crate::DbError;
use crate::store::RiskRepository;
use analytics::TimeBandTracker;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{BAND_COUNT, DailyTick, GridPoint, SignalReport, TickOutcome, TimeBandRecord};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    grids: BTreeMap<String, Vec<GridPoint>>,
    records: BTreeMap<String, TimeBandRecord>,
    history: BTreeMap<(String, NaiveDate), DailyTick>,
    scores: BTreeMap<String, SignalReport>,
}

/// An in-process `RiskRepository`.
///
/// A single mutex guards all state, which gives every operation the same
/// atomicity the Postgres transactions provide.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded history of a symbol, oldest day first.
    pub async fn history(&self, symbol: &str) -> Vec<DailyTick> {
        let state = self.state.lock().await;
        state
            .history
            .values()
            .filter(|tick| tick.symbol == symbol)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RiskRepository for MemoryRepository {
    async fn tracked_symbols(&self) -> Result<Vec<String>, DbError> {
        Ok(self.state.lock().await.records.keys().cloned().collect())
    }

    async fn ensure_tracked(&self, symbol: &str, started_on: NaiveDate) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        if state.records.contains_key(symbol) {
            return Ok(false);
        }
        state
            .records
            .insert(symbol.to_string(), TimeBandRecord::new(symbol, started_on));
        Ok(true)
    }

    async fn load_grid_points(&self) -> Result<Vec<GridPoint>, DbError> {
        let state = self.state.lock().await;
        Ok(state.grids.values().flatten().cloned().collect())
    }

    async fn load_grid(&self, symbol: &str) -> Result<Vec<GridPoint>, DbError> {
        let state = self.state.lock().await;
        Ok(state.grids.get(symbol).cloned().unwrap_or_default())
    }

    async fn replace_grid(&self, symbol: &str, points: &[GridPoint]) -> Result<(), DbError> {
        let mut points: Vec<GridPoint> = points
            .iter()
            .map(|p| GridPoint::new(symbol, p.price, p.risk))
            .collect();
        points.sort_by(|a, b| a.risk.cmp(&b.risk));

        self.state
            .lock()
            .await
            .grids
            .insert(symbol.to_string(), points);
        Ok(())
    }

    async fn get_band_record(&self, symbol: &str) -> Result<Option<TimeBandRecord>, DbError> {
        Ok(self.state.lock().await.records.get(symbol).cloned())
    }

    async fn list_band_records(&self) -> Result<Vec<TimeBandRecord>, DbError> {
        Ok(self.state.lock().await.records.values().cloned().collect())
    }

    async fn save_band_counts(&self, record: &TimeBandRecord) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let stored = state
            .records
            .get_mut(&record.symbol)
            .ok_or_else(|| DbError::UnknownSymbol(record.symbol.clone()))?;
        stored.total_days = record.total_days;
        stored.band_counts = record.band_counts;
        stored.band_coefficients = record.band_coefficients;
        Ok(())
    }

    async fn record_daily_tick(&self, tick: &DailyTick) -> Result<TickOutcome, DbError> {
        let mut state = self.state.lock().await;
        let MemoryState {
            records, history, ..
        } = &mut *state;

        let record = records
            .get_mut(&tick.symbol)
            .ok_or_else(|| DbError::UnknownSymbol(tick.symbol.clone()))?;
        let first_for_date = history
            .insert((tick.symbol.clone(), tick.date), tick.clone())
            .is_none();

        Ok(TimeBandTracker::new().apply(record, tick, first_for_date))
    }

    async fn save_coefficients(
        &self,
        symbol: &str,
        coefficients: &[Decimal; BAND_COUNT],
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let record = state
            .records
            .get_mut(symbol)
            .ok_or_else(|| DbError::UnknownSymbol(symbol.to_string()))?;
        record.band_coefficients = *coefficients;
        Ok(())
    }

    async fn save_score(&self, report: &SignalReport) -> Result<(), DbError> {
        self.state
            .lock()
            .await
            .scores
            .insert(report.symbol.clone(), report.clone());
        Ok(())
    }

    async fn get_score(&self, symbol: &str) -> Result<Option<SignalReport>, DbError> {
        Ok(self.state.lock().await.scores.get(symbol).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn tick(risk: Decimal, date: NaiveDate) -> DailyTick {
        TimeBandTracker::new().observe("BTCUSDT", risk, dec!(60000), date, Uuid::new_v4(), Utc::now())
    }

    #[tokio::test]
    async fn same_date_is_counted_once() {
        let repo = MemoryRepository::new();
        assert!(repo.ensure_tracked("BTCUSDT", day(1)).await.unwrap());
        assert!(!repo.ensure_tracked("BTCUSDT", day(1)).await.unwrap());

        let first = repo.record_daily_tick(&tick(dec!(0.42), day(2))).await.unwrap();
        let again = repo.record_daily_tick(&tick(dec!(0.57), day(2))).await.unwrap();
        assert_eq!(first, TickOutcome::Counted);
        assert_eq!(again, TickOutcome::Refreshed);

        let record = repo.get_band_record("BTCUSDT").await.unwrap().unwrap();
        assert_eq!(record.total_days, 1);
        assert_eq!(record.band_counts[4], 1);
        assert_eq!(record.band_counts[5], 0);
        assert_eq!(record.current_band, Some(5));
        assert_eq!(record.current_risk, Some(dec!(0.57)));

        let history = repo.history("BTCUSDT").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].risk, dec!(0.57));
    }

    #[tokio::test]
    async fn untracked_symbol_is_rejected() {
        let repo = MemoryRepository::new();
        let err = repo.record_daily_tick(&tick(dec!(0.5), day(2))).await.unwrap_err();
        assert!(matches!(err, DbError::UnknownSymbol(symbol) if symbol == "BTCUSDT"));
    }

    #[tokio::test]
    async fn replacing_a_grid_overwrites_it() {
        let repo = MemoryRepository::new();
        let old = vec![
            GridPoint::new("ETHUSDT", dec!(100), dec!(0)),
            GridPoint::new("ETHUSDT", dec!(5000), dec!(1)),
        ];
        let new = vec![
            GridPoint::new("ETHUSDT", dec!(4000), dec!(1)),
            GridPoint::new("ETHUSDT", dec!(80), dec!(0)),
            GridPoint::new("ETHUSDT", dec!(900), dec!(0.5)),
        ];
        repo.replace_grid("ETHUSDT", &old).await.unwrap();
        repo.replace_grid("ETHUSDT", &new).await.unwrap();

        let grid = repo.load_grid("ETHUSDT").await.unwrap();
        let risks: Vec<Decimal> = grid.iter().map(|p| p.risk).collect();
        assert_eq!(risks, vec![dec!(0), dec!(0.5), dec!(1)]);
        assert!(repo.load_grid("SOLUSDT").await.unwrap().is_empty());
    }
}
