use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: Tracking,
    #[serde(default)]
    pub price_source: PriceSource,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub logging: Logging,
}

/// Which span of history `total_days` is meant to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DaysBasis {
    /// Count every day since the asset was listed.
    Lifetime,
    /// Count only the days since the symbol started being tracked.
    #[default]
    TrackingStart,
}

/// The set of assets the daily update runs over.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tracking {
    #[serde(default)]
    pub days_basis: DaysBasis,
    #[serde(default)]
    pub assets: Vec<TrackedAsset>,
}

impl Tracking {
    /// Looks up a configured asset by symbol (case-insensitive).
    pub fn asset(&self, symbol: &str) -> Option<&TrackedAsset> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }
}

/// A single tracked asset.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackedAsset {
    /// The exchange symbol, e.g. "BTCUSDT".
    pub symbol: String,
    /// First trading day of the asset. Used as the default backfill start
    /// when `days_basis = "lifetime"`.
    pub listed_on: Option<NaiveDate>,
}

/// Settings for the external current-price collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSource {
    pub base_url: String,
    /// Hard timeout for a single price request. A slow symbol is skipped.
    pub timeout_secs: u64,
}

impl Default for PriceSource {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 5,
        }
    }
}

/// When the scheduled daily update fires.
#[derive(Debug, Clone, Deserialize)]
pub struct Schedule {
    /// Time of day (UTC) at which the daily update runs.
    pub run_at_utc: NaiveTime,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            run_at_utc: NaiveTime::from_hms_opt(0, 5, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Settings for the read-only query API.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Settings for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for the daily-rolling log file.
    pub directory: String,
    pub file_prefix: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "riskband.log".to_string(),
        }
    }
}
