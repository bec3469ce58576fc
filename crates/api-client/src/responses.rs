use crate::error::ApiError;
use chrono::{TimeZone, Utc};
use core_types::{Kline, PriceSnapshot};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// The response from `GET /api/v3/ticker/price?symbol=...`.
/// Binance sends the price as a string to preserve precision.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: String,
}

impl TickerPriceResponse {
    /// Converts to a snapshot, rejecting prices that are not strictly positive.
    pub fn into_snapshot(self) -> Result<PriceSnapshot, ApiError> {
        let price = parse_decimal("price", &self.price)?;
        if price <= Decimal::ZERO {
            return Err(ApiError::InvalidData(format!(
                "non-positive price {price} for {}",
                self.symbol
            )));
        }
        Ok(PriceSnapshot {
            symbol: self.symbol,
            price,
            fetched_at: Utc::now(),
        })
    }
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// One row of `GET /api/v3/klines`, a positional JSON array.
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub i64,
    pub String,
    pub i64,
    pub String,
    pub String,
    pub String,
);

impl RawKline {
    pub fn into_kline(self, interval: &str) -> Result<Kline, ApiError> {
        Ok(Kline {
            open_time: Utc
                .timestamp_millis_opt(self.0)
                .single()
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid open_time: {}", self.0)))?,
            open: parse_decimal("open", &self.1)?,
            high: parse_decimal("high", &self.2)?,
            low: parse_decimal("low", &self.3)?,
            close: parse_decimal("close", &self.4)?,
            volume: parse_decimal("volume", &self.5)?,
            close_time: Utc
                .timestamp_millis_opt(self.6)
                .single()
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid close_time: {}", self.6)))?,
            interval: interval.to_string(),
        })
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|e| ApiError::Deserialization(format!("{field} '{raw}': {e}")))
}
