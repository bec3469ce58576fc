use crate::error::ApiError;
use crate::responses::{ApiErrorResponse, RawKline, TickerPriceResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use configuration::PriceSource as PriceSourceSettings;
use core_types::{Kline, PriceSnapshot};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod error;
pub mod responses;

/// Binance caps a klines request at this many rows.
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// The read-only market data interface the engine depends on.
/// Implementations can be swapped for a stub in tests.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the latest traded price of `symbol`.
    async fn current_price(&self, symbol: &str) -> Result<PriceSnapshot, ApiError>;

    /// Fetches historical klines for `symbol` between two instants.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<Kline>, ApiError>;
}

/// A `PriceSource` backed by the public Binance spot REST API.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(settings: &PriceSourceSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_error) => Err(ApiError::BinanceError(api_error.code, api_error.msg)),
                Err(_) => Err(ApiError::Status(status.as_u16(), text)),
            }
        }
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    async fn current_price(&self, symbol: &str) -> Result<PriceSnapshot, ApiError> {
        let ticker: TickerPriceResponse = self
            .get_public("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        ticker.into_snapshot()
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<Kline>, ApiError> {
        let rows: Vec<RawKline> = self
            .get_public(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("startTime", start_time.timestamp_millis().to_string()),
                    ("endTime", end_time.timestamp_millis().to_string()),
                    ("limit", MAX_KLINES_PER_REQUEST.to_string()),
                ],
            )
            .await?;

        tracing::debug!(symbol, interval, rows = rows.len(), "Fetched klines");

        rows.into_iter()
            .map(|raw| raw.into_kline(interval))
            .collect::<Result<Vec<Kline>, ApiError>>()
    }
}
