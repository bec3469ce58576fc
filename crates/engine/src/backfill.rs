use crate::error::EngineError;
use crate::grids::load_grid;
use crate::updater::DailyUpdater;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use configuration::DaysBasis;
use core_types::{Kline, TickOutcome, TimeBandRecord};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::Instrument;
use uuid::Uuid;

/// The candle interval backfill replays. One close per calendar day.
pub const BACKFILL_INTERVAL: &str = "1d";

/// Outcome of one backfill.
#[derive(Debug, Clone)]
pub struct BackfillSummary {
    pub symbol: String,
    pub run_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub counted: usize,
    pub refreshed: usize,
    /// Request windows whose fetch failed; their days were not replayed.
    pub failed_windows: usize,
}

/// Splits `[from, to]` into calendar-month windows, the first and last
/// clipped to the range. Empty when `from > to`.
pub fn monthly_ranges(mut from: NaiveDate, to: NaiveDate) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut ranges = Vec::new();

    while from <= to {
        let (next_year, next_month) = if from.month() == 12 {
            (from.year() + 1, 1)
        } else {
            (from.year(), from.month() + 1)
        };
        let end_of_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(to);
        let end = end_of_month.min(to);

        ranges.push((
            from.and_time(chrono::NaiveTime::MIN).and_utc(),
            end.and_hms_milli_opt(23, 59, 59, 999)
                .unwrap_or_else(|| end.and_time(chrono::NaiveTime::MIN))
                .and_utc(),
        ));

        match end.succ_opt() {
            Some(next) => from = next,
            None => break,
        }
    }

    ranges
}

/// Where a backfill starts when no explicit date is given.
///
/// `Lifetime` starts at the asset's listing date so that `total_days` spans
/// its whole history; `TrackingStart` only fills the tracked period. A
/// lifetime basis without a configured listing date falls back to the
/// tracking start.
pub fn default_start(
    basis: DaysBasis,
    listed_on: Option<NaiveDate>,
    record: &TimeBandRecord,
) -> NaiveDate {
    match (basis, listed_on) {
        (DaysBasis::Lifetime, Some(listed)) => listed,
        (DaysBasis::Lifetime, None) => {
            tracing::warn!(
                symbol = %record.symbol,
                "No listed_on date configured, backfilling from tracking start"
            );
            record.tracking_started_on
        }
        (DaysBasis::TrackingStart, _) => record.tracking_started_on,
    }
}

/// One close price per day, the last candle winning if a day repeats.
fn daily_closes(klines: Vec<Kline>, from: NaiveDate, to: NaiveDate) -> BTreeMap<NaiveDate, Decimal> {
    klines
        .into_iter()
        .map(|kline| (kline.open_time.date_naive(), kline.close))
        .filter(|(day, close)| *day >= from && *day <= to && *close > Decimal::ZERO)
        .collect()
}

impl DailyUpdater {
    /// Replays daily closes for `symbol` through the idempotent tick path,
    /// then recomputes coefficients and the score.
    ///
    /// `from` defaults per the configured days basis; `to` is inclusive.
    /// Days already recorded are refreshed, never counted twice.
    pub async fn backfill(
        &self,
        symbol: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<BackfillSummary, EngineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("backfill", %run_id, symbol);
        self.backfill_inner(run_id, symbol, from, to)
            .instrument(span)
            .await
    }

    async fn backfill_inner(
        &self,
        run_id: Uuid,
        symbol: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<BackfillSummary, EngineError> {
        let grid = load_grid(self.repo(), symbol).await?;

        self.repo().ensure_tracked(symbol, Utc::now().date_naive()).await?;
        let record = self
            .repo()
            .get_band_record(symbol)
            .await?
            .ok_or_else(|| EngineError::NotTracked(symbol.to_string()))?;

        let start = from.unwrap_or_else(|| {
            let listed_on = self.tracking.asset(symbol).and_then(|a| a.listed_on);
            default_start(self.tracking.days_basis, listed_on, &record)
        });

        let mut summary = BackfillSummary {
            symbol: symbol.to_string(),
            run_id,
            from: start,
            to,
            counted: 0,
            refreshed: 0,
            failed_windows: 0,
        };
        if start > to {
            tracing::info!(%start, %to, "Nothing to backfill");
            return Ok(summary);
        }

        let windows = monthly_ranges(start, to);
        tracing::info!(%start, %to, windows = windows.len(), "Fetching history");

        let fetches = windows.iter().map(|(window_start, window_end)| {
            self.prices()
                .fetch_klines(symbol, BACKFILL_INTERVAL, *window_start, *window_end)
        });

        let mut klines = Vec::new();
        for ((window_start, _), result) in windows.iter().zip(join_all(fetches).await) {
            match result {
                Ok(batch) => klines.extend(batch),
                Err(e) => {
                    tracing::warn!(window = %window_start.format("%Y-%m"), error = %e, "Window fetch failed");
                    summary.failed_windows += 1;
                }
            }
        }

        // Oldest first, so the record's current state ends on the newest day.
        for (day, close) in daily_closes(klines, start, to) {
            match self.apply_tick(&grid, symbol, close, day, run_id).await? {
                TickOutcome::Counted => summary.counted += 1,
                TickOutcome::Refreshed => summary.refreshed += 1,
            }
        }

        self.recompute_coefficients(symbol).await?;
        self.rescore(symbol, &grid).await?;

        tracing::info!(
            counted = summary.counted,
            refreshed = summary.refreshed,
            failed_windows = summary.failed_windows,
            "Backfill finished"
        );
        Ok(summary)
    }
}
