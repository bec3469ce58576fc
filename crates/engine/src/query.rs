use crate::error::EngineError;
use crate::grids::{import_grid, load_grid};
use analytics::AnalyticsEngine;
use chrono::Utc;
use core_types::{GridPoint, SignalReport, TimeBandRecord};
use database::RiskRepository;
use risk::RiskGrid;
use rust_decimal::Decimal;
use std::sync::Arc;

/// One row of the status overview: a band record and its latest stored score.
#[derive(Debug, Clone)]
pub struct SymbolStatus {
    pub record: TimeBandRecord,
    pub score: Option<SignalReport>,
}

/// Read-side access to grids, band records and signals.
///
/// Shared by the CLI and the HTTP API. Nothing here mutates band state;
/// the only write is a grid import.
#[derive(Clone)]
pub struct RiskService {
    repo: Arc<dyn RiskRepository>,
    analytics: AnalyticsEngine,
}

impl RiskService {
    pub fn new(repo: Arc<dyn RiskRepository>) -> Self {
        Self {
            repo,
            analytics: AnalyticsEngine::new(),
        }
    }

    /// Risk of `symbol` at `price`, clamped to the grid's range.
    pub async fn risk_of(&self, symbol: &str, price: Decimal) -> Result<Decimal, EngineError> {
        if price <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "price must be positive, got {price}"
            )));
        }
        Ok(self.grid(symbol).await?.risk_at(price))
    }

    /// Price of `symbol` at `risk`, which must lie in `[0, 1]`.
    pub async fn price_of(&self, symbol: &str, risk: Decimal) -> Result<Decimal, EngineError> {
        if risk < Decimal::ZERO || risk > Decimal::ONE {
            return Err(EngineError::InvalidInput(format!(
                "risk must be within [0, 1], got {risk}"
            )));
        }
        Ok(self.grid(symbol).await?.price_at(risk))
    }

    /// The current signal of `symbol`, derived fresh from its band record.
    pub async fn score_of(&self, symbol: &str) -> Result<SignalReport, EngineError> {
        let record = self
            .repo
            .get_band_record(symbol)
            .await?
            .ok_or_else(|| EngineError::NotTracked(symbol.to_string()))?;
        let grid = self.grid(symbol).await?;

        Ok(self.analytics.evaluate(&record, &grid, Utc::now())?)
    }

    pub async fn symbols(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.repo.tracked_symbols().await?)
    }

    pub async fn status(&self) -> Result<Vec<SymbolStatus>, EngineError> {
        let mut rows = Vec::new();
        for record in self.repo.list_band_records().await? {
            let score = self.repo.get_score(&record.symbol).await?;
            rows.push(SymbolStatus { record, score });
        }
        Ok(rows)
    }

    pub async fn grid(&self, symbol: &str) -> Result<RiskGrid, EngineError> {
        load_grid(self.repo.as_ref(), symbol).await
    }

    pub async fn import_grid(
        &self,
        symbol: &str,
        points: Vec<GridPoint>,
    ) -> Result<RiskGrid, EngineError> {
        import_grid(self.repo.as_ref(), symbol, points).await
    }
}
