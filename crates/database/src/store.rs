use crate::DbError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{BAND_COUNT, DailyTick, GridPoint, SignalReport, TickOutcome, TimeBandRecord};
use rust_decimal::Decimal;

/// Everything the engine persists, behind one async seam.
///
/// `DbRepository` is the production implementation. `MemoryRepository`
/// keeps the same contract in process for tests and dry runs.
#[async_trait]
pub trait RiskRepository: Send + Sync {
    /// Symbols with a band record, sorted.
    async fn tracked_symbols(&self) -> Result<Vec<String>, DbError>;

    /// Creates an empty band record for `symbol` unless one exists.
    /// Returns true when a record was created.
    async fn ensure_tracked(&self, symbol: &str, started_on: NaiveDate) -> Result<bool, DbError>;

    /// Every stored grid point, ordered by symbol then risk.
    async fn load_grid_points(&self) -> Result<Vec<GridPoint>, DbError>;

    /// Grid points of one symbol, ordered by risk. Empty if none are stored.
    async fn load_grid(&self, symbol: &str) -> Result<Vec<GridPoint>, DbError>;

    /// Replaces a symbol's whole grid atomically. Callers validate first.
    async fn replace_grid(&self, symbol: &str, points: &[GridPoint]) -> Result<(), DbError>;

    async fn get_band_record(&self, symbol: &str) -> Result<Option<TimeBandRecord>, DbError>;

    async fn list_band_records(&self) -> Result<Vec<TimeBandRecord>, DbError>;

    /// Overwrites the counters and coefficients of an existing record.
    async fn save_band_counts(&self, record: &TimeBandRecord) -> Result<(), DbError>;

    /// Applies one daily tick atomically.
    ///
    /// The `(symbol, date)` pair is the idempotency key: the first tick for a
    /// date counts the day, later ones only refresh the current-state fields.
    /// Fails with `UnknownSymbol` if the symbol has no band record.
    async fn record_daily_tick(&self, tick: &DailyTick) -> Result<TickOutcome, DbError>;

    async fn save_coefficients(
        &self,
        symbol: &str,
        coefficients: &[Decimal; BAND_COUNT],
    ) -> Result<(), DbError>;

    /// Stores the latest score of a symbol, replacing the previous one.
    async fn save_score(&self, report: &SignalReport) -> Result<(), DbError>;

    async fn get_score(&self, symbol: &str) -> Result<Option<SignalReport>, DbError>;
}
