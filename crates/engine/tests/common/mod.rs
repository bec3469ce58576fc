#![allow(dead_code)]

use api_client::PriceSource;
use api_client::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use configuration::{Config, DaysBasis, TrackedAsset, Tracking};
use core_types::{GridPoint, Kline, PriceSnapshot};
use database::{MemoryRepository, RiskRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A price source that answers from fixed tables.
#[derive(Default)]
pub struct StubPrices {
    prices: Mutex<HashMap<String, Decimal>>,
    klines: Mutex<HashMap<String, Vec<Kline>>>,
}

impl StubPrices {
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    /// Makes `current_price` fail for `symbol` from now on.
    pub fn clear_price(&self, symbol: &str) {
        self.prices.lock().unwrap().remove(symbol);
    }

    pub fn add_daily_close(&self, symbol: &str, day: NaiveDate, close: Decimal) {
        let open_time = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let kline = Kline {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
            close_time: open_time + Duration::days(1) - Duration::milliseconds(1),
            interval: "1d".to_string(),
        };
        self.klines
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(kline);
    }
}

#[async_trait]
impl PriceSource for StubPrices {
    async fn current_price(&self, symbol: &str) -> Result<PriceSnapshot, ApiError> {
        let price = self
            .prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| ApiError::BinanceError(-1121, "Invalid symbol.".to_string()))?;
        Ok(PriceSnapshot {
            symbol: symbol.to_string(),
            price,
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        _interval: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<Kline>, ApiError> {
        let klines = self.klines.lock().unwrap();
        Ok(klines
            .get(symbol)
            .map(|all| {
                all.iter()
                    .filter(|k| k.open_time >= start_time && k.open_time <= end_time)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn config(symbols: &[&str]) -> Config {
    Config {
        tracking: Tracking {
            days_basis: DaysBasis::TrackingStart,
            assets: symbols
                .iter()
                .map(|s| TrackedAsset {
                    symbol: s.to_string(),
                    listed_on: None,
                })
                .collect(),
        },
        ..Config::default()
    }
}

/// A straight-line grid: risk 0 at `low`, risk 1 at `high`.
pub async fn linear_grid(repo: &MemoryRepository, symbol: &str, low: Decimal, high: Decimal) {
    repo.replace_grid(
        symbol,
        &[
            GridPoint::new(symbol, low, dec!(0)),
            GridPoint::new(symbol, high, dec!(1)),
        ],
    )
    .await
    .unwrap();
}

pub fn shared(repo: MemoryRepository, prices: StubPrices) -> (Arc<MemoryRepository>, Arc<StubPrices>) {
    (Arc::new(repo), Arc::new(prices))
}
