use crate::DbError;
use crate::store::RiskRepository;
use analytics::TimeBandTracker;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{
    BAND_COUNT, DailyTick, GridPoint, SignalReport, TargetSuggestion, TickOutcome, TimeBandRecord,
    band_index,
};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{Executor, FromRow, Row, Transaction};
use std::str::FromStr;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

const RECORD_COLUMNS: &str = "symbol, total_days, band_counts, band_coefficients, current_risk, \
     current_price, current_band, last_update_timestamp, last_tick_date, tracking_started_on";

/// A row of `time_band_records` as Postgres stores it.
#[derive(Debug, Clone, FromRow)]
struct DbBandRecord {
    symbol: String,
    total_days: i32,
    band_counts: Vec<i32>,
    band_coefficients: Vec<Decimal>,
    current_risk: Option<Decimal>,
    current_price: Option<Decimal>,
    current_band: Option<i16>,
    last_update_timestamp: Option<DateTime<Utc>>,
    last_tick_date: Option<NaiveDate>,
    tracking_started_on: NaiveDate,
}

impl TryFrom<DbBandRecord> for TimeBandRecord {
    type Error = DbError;

    fn try_from(row: DbBandRecord) -> Result<Self, Self::Error> {
        let counts: Vec<u32> = row
            .band_counts
            .iter()
            .map(|&days| u32::try_from(days))
            .collect::<Result<_, _>>()
            .map_err(|_| invalid(&row.symbol, "negative band count"))?;
        let band_counts: [u32; BAND_COUNT] = counts
            .try_into()
            .map_err(|_| invalid(&row.symbol, "band_counts must have 10 elements"))?;
        let band_coefficients: [Decimal; BAND_COUNT] = row
            .band_coefficients
            .clone()
            .try_into()
            .map_err(|_| invalid(&row.symbol, "band_coefficients must have 10 elements"))?;
        let total_days = u32::try_from(row.total_days)
            .map_err(|_| invalid(&row.symbol, "negative total_days"))?;
        let current_band = row
            .current_band
            .map(|band| band_index(band).map_err(|e| invalid(&row.symbol, &e.to_string())))
            .transpose()?;

        Ok(TimeBandRecord {
            symbol: row.symbol,
            total_days,
            band_counts,
            band_coefficients,
            current_risk: row.current_risk,
            current_price: row.current_price,
            current_band,
            last_update_timestamp: row.last_update_timestamp,
            last_tick_date: row.last_tick_date,
            tracking_started_on: row.tracking_started_on,
        })
    }
}

/// A row of `signal_scores`.
#[derive(Debug, Clone, FromRow)]
struct DbSignalScore {
    symbol: String,
    risk: Decimal,
    band: i16,
    base_score: Decimal,
    coefficient: Decimal,
    total_score: Decimal,
    signal_type: String,
    signal_strength: String,
    target: JsonValue,
    scored_at: DateTime<Utc>,
}

impl TryFrom<DbSignalScore> for SignalReport {
    type Error = DbError;

    fn try_from(row: DbSignalScore) -> Result<Self, Self::Error> {
        let signal_type = core_types::SignalType::from_str(&row.signal_type)
            .map_err(|e| invalid(&row.symbol, &e.to_string()))?;
        let signal_strength = core_types::SignalStrength::from_str(&row.signal_strength)
            .map_err(|e| invalid(&row.symbol, &e.to_string()))?;
        let band = band_index(row.band).map_err(|e| invalid(&row.symbol, &e.to_string()))?;
        let target: TargetSuggestion = serde_json::from_value(row.target)?;

        Ok(SignalReport {
            symbol: row.symbol,
            risk: row.risk,
            band,
            base_score: row.base_score,
            coefficient: row.coefficient,
            total_score: row.total_score,
            signal_type,
            signal_strength,
            target,
            scored_at: row.scored_at,
        })
    }
}

fn invalid(symbol: &str, reason: &str) -> DbError {
    DbError::InvalidData(format!("{symbol}: {reason}"))
}

fn counts_to_db(counts: &[u32; BAND_COUNT]) -> Vec<i32> {
    counts.iter().map(|&days| days as i32).collect()
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches a band record and locks its row until the transaction ends.
    async fn lock_band_record(
        tx: &mut Transaction<'_, Postgres>,
        symbol: &str,
    ) -> Result<TimeBandRecord, DbError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM time_band_records WHERE symbol = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, DbBandRecord>(&query)
            .bind(symbol)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| DbError::UnknownSymbol(symbol.to_string()))?;
        row.try_into()
    }

    /// Writes every mutable field of a band record.
    async fn write_band_record<'e, E>(executor: E, record: &TimeBandRecord) -> Result<(), DbError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE time_band_records
            SET total_days = $2, band_counts = $3, band_coefficients = $4,
                current_risk = $5, current_price = $6, current_band = $7,
                last_update_timestamp = $8, last_tick_date = $9
            WHERE symbol = $1
            "#,
        )
        .bind(&record.symbol)
        .bind(record.total_days as i32)
        .bind(counts_to_db(&record.band_counts))
        .bind(record.band_coefficients.to_vec())
        .bind(record.current_risk)
        .bind(record.current_price)
        .bind(record.current_band.map(|band| band as i16))
        .bind(record.last_update_timestamp)
        .bind(record.last_tick_date)
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RiskRepository for DbRepository {
    async fn tracked_symbols(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query("SELECT symbol FROM time_band_records ORDER BY symbol ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get("symbol")).collect())
    }

    async fn ensure_tracked(&self, symbol: &str, started_on: NaiveDate) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO time_band_records (symbol, total_days, band_counts, band_coefficients, tracking_started_on)
            VALUES ($1, 0, $2, $3, $4)
            ON CONFLICT (symbol) DO NOTHING
            "#,
        )
        .bind(symbol)
        .bind(vec![0i32; BAND_COUNT])
        .bind(vec![Decimal::ONE; BAND_COUNT])
        .bind(started_on)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn load_grid_points(&self) -> Result<Vec<GridPoint>, DbError> {
        let rows = sqlx::query("SELECT symbol, price, risk FROM grid_points ORDER BY symbol ASC, risk ASC")
            .fetch_all(&self.pool)
            .await?;

        let points = rows
            .into_iter()
            .map(|row| GridPoint {
                symbol: row.get("symbol"),
                price: row.get("price"),
                risk: row.get("risk"),
            })
            .collect();
        Ok(points)
    }

    async fn load_grid(&self, symbol: &str) -> Result<Vec<GridPoint>, DbError> {
        let rows = sqlx::query("SELECT price, risk FROM grid_points WHERE symbol = $1 ORDER BY risk ASC")
            .bind(symbol)
            .fetch_all(&self.pool)
            .await?;

        let points = rows
            .into_iter()
            .map(|row| GridPoint::new(symbol, row.get("price"), row.get("risk")))
            .collect();
        Ok(points)
    }

    /// Deletes and re-inserts the grid within a single transaction, so readers
    /// never observe a partial grid.
    async fn replace_grid(&self, symbol: &str, points: &[GridPoint]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM grid_points WHERE symbol = $1")
            .bind(symbol)
            .execute(&mut *tx)
            .await?;

        for point in points {
            sqlx::query("INSERT INTO grid_points (symbol, risk, price) VALUES ($1, $2, $3)")
                .bind(symbol)
                .bind(point.risk)
                .bind(point.price)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_band_record(&self, symbol: &str) -> Result<Option<TimeBandRecord>, DbError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM time_band_records WHERE symbol = $1");
        let row = sqlx::query_as::<_, DbBandRecord>(&query)
            .bind(symbol)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TimeBandRecord::try_from).transpose()
    }

    async fn list_band_records(&self) -> Result<Vec<TimeBandRecord>, DbError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM time_band_records ORDER BY symbol ASC");
        let rows = sqlx::query_as::<_, DbBandRecord>(&query)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TimeBandRecord::try_from).collect()
    }

    async fn save_band_counts(&self, record: &TimeBandRecord) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE time_band_records
            SET total_days = $2, band_counts = $3, band_coefficients = $4
            WHERE symbol = $1
            "#,
        )
        .bind(&record.symbol)
        .bind(record.total_days as i32)
        .bind(counts_to_db(&record.band_counts))
        .bind(record.band_coefficients.to_vec())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::UnknownSymbol(record.symbol.clone()));
        }
        Ok(())
    }

    /// The history insert and the record update share one transaction, with
    /// the record row locked, so concurrent ticks for a symbol serialize and
    /// an interrupted run never leaves a counted day without its history row.
    async fn record_daily_tick(&self, tick: &DailyTick) -> Result<TickOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let mut record = Self::lock_band_record(&mut tx, &tick.symbol).await?;

        // `xmax = 0` only for a freshly inserted row; an upsert that hit the
        // conflict branch carries the updating transaction id.
        let first_for_date: bool = sqlx::query_scalar(
            r#"
            INSERT INTO band_history (symbol, day, risk, price, band, run_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (symbol, day) DO UPDATE
            SET risk = EXCLUDED.risk, price = EXCLUDED.price, band = EXCLUDED.band,
                run_id = EXCLUDED.run_id, recorded_at = EXCLUDED.recorded_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&tick.symbol)
        .bind(tick.date)
        .bind(tick.risk)
        .bind(tick.price)
        .bind(tick.band as i16)
        .bind(tick.run_id)
        .bind(tick.recorded_at)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = TimeBandTracker::new().apply(&mut record, tick, first_for_date);
        Self::write_band_record(&mut *tx, &record).await?;

        tx.commit().await?;
        Ok(outcome)
    }

    async fn save_coefficients(
        &self,
        symbol: &str,
        coefficients: &[Decimal; BAND_COUNT],
    ) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE time_band_records SET band_coefficients = $2 WHERE symbol = $1")
            .bind(symbol)
            .bind(coefficients.to_vec())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::UnknownSymbol(symbol.to_string()));
        }
        Ok(())
    }

    async fn save_score(&self, report: &SignalReport) -> Result<(), DbError> {
        let target = serde_json::to_value(&report.target)?;

        sqlx::query(
            r#"
            INSERT INTO signal_scores (
                symbol, risk, band, base_score, coefficient, total_score,
                signal_type, signal_strength, target, scored_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (symbol) DO UPDATE
            SET risk = EXCLUDED.risk, band = EXCLUDED.band, base_score = EXCLUDED.base_score,
                coefficient = EXCLUDED.coefficient, total_score = EXCLUDED.total_score,
                signal_type = EXCLUDED.signal_type, signal_strength = EXCLUDED.signal_strength,
                target = EXCLUDED.target, scored_at = EXCLUDED.scored_at
            "#,
        )
        .bind(&report.symbol)
        .bind(report.risk)
        .bind(report.band as i16)
        .bind(report.base_score)
        .bind(report.coefficient)
        .bind(report.total_score)
        .bind(report.signal_type.as_str())
        .bind(report.signal_strength.as_str())
        .bind(target)
        .bind(report.scored_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_score(&self, symbol: &str) -> Result<Option<SignalReport>, DbError> {
        let row = sqlx::query_as::<_, DbSignalScore>(
            r#"
            SELECT symbol, risk, band, base_score, coefficient, total_score,
                   signal_type, signal_strength, target, scored_at
            FROM signal_scores
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SignalReport::try_from).transpose()
    }
}
