use crate::error::EngineError;
use crate::grids::{load_grid, load_grid_store};
use analytics::{AnalyticsEngine, CoefficientCalculator, TimeBandTracker};
use api_client::PriceSource;
use chrono::{NaiveDate, Utc};
use configuration::{Config, Tracking};
use core_types::{BAND_COUNT, SignalReport, TickOutcome, TimeBandRecord};
use database::RiskRepository;
use futures_util::future::join_all;
use risk::{RiskGrid, RiskGridStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// A symbol the run could not tick, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// What a daily run did, per symbol.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub date: NaiveDate,
    /// Symbols whose day was counted for the first time.
    pub counted: Vec<String>,
    /// Symbols whose day was already recorded; only current state changed.
    pub refreshed: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
    pub scored: Vec<String>,
}

/// The once-per-day batch: tick every tracked symbol, then recompute all
/// coefficients, then rescore every symbol.
///
/// The phases run strictly in that order. Ticks run concurrently across
/// symbols; a symbol that fails any phase is logged and skipped, and the
/// batch carries on.
pub struct DailyUpdater {
    repo: Arc<dyn RiskRepository>,
    prices: Arc<dyn PriceSource>,
    pub(crate) tracking: Tracking,
    price_timeout: Duration,
    tracker: TimeBandTracker,
    coefficients: CoefficientCalculator,
    analytics: AnalyticsEngine,
}

impl DailyUpdater {
    pub fn new(
        repo: Arc<dyn RiskRepository>,
        prices: Arc<dyn PriceSource>,
        config: &Config,
    ) -> Self {
        Self {
            repo,
            prices,
            tracking: config.tracking.clone(),
            price_timeout: Duration::from_secs(config.price_source.timeout_secs),
            tracker: TimeBandTracker::new(),
            coefficients: CoefficientCalculator::new(),
            analytics: AnalyticsEngine::new(),
        }
    }

    pub(crate) fn repo(&self) -> &dyn RiskRepository {
        self.repo.as_ref()
    }

    pub(crate) fn prices(&self) -> &Arc<dyn PriceSource> {
        &self.prices
    }

    /// Registers every configured asset that has no band record yet.
    /// Returns how many were created.
    pub async fn register_assets(&self, today: NaiveDate) -> Result<usize, EngineError> {
        let mut created = 0;
        for asset in &self.tracking.assets {
            if self.repo.ensure_tracked(&asset.symbol, today).await? {
                tracing::info!(symbol = %asset.symbol, "Started tracking");
                created += 1;
            }
        }
        Ok(created)
    }

    /// Runs the full daily update for `date`. Safe to re-run for the same date.
    pub async fn run(&self, date: NaiveDate) -> Result<RunSummary, EngineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("daily_update", %run_id, %date);
        self.run_inner(run_id, date).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, date: NaiveDate) -> Result<RunSummary, EngineError> {
        tracing::info!("Starting daily update");
        self.register_assets(date).await?;

        let grids = load_grid_store(self.repo.as_ref()).await?;
        let symbols = self.repo.tracked_symbols().await?;

        let mut summary = RunSummary {
            run_id,
            date,
            counted: Vec::new(),
            refreshed: Vec::new(),
            skipped: Vec::new(),
            scored: Vec::new(),
        };

        // --- Phase 1: ticks ---
        let ticks = join_all(
            symbols
                .iter()
                .map(|symbol| self.tick_symbol(&grids, symbol, date, run_id)),
        )
        .await;

        for (symbol, result) in symbols.iter().zip(ticks) {
            match result {
                Ok(TickOutcome::Counted) => summary.counted.push(symbol.clone()),
                Ok(TickOutcome::Refreshed) => summary.refreshed.push(symbol.clone()),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Skipping symbol for this run");
                    summary.skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Skipped symbols keep their previous coefficients and score untouched.
        let ticked: Vec<&String> = symbols
            .iter()
            .filter(|symbol| !summary.skipped.iter().any(|s| &s.symbol == *symbol))
            .collect();

        // --- Phase 2: coefficients, only after every tick has landed ---
        for symbol in &ticked {
            if let Err(e) = self.recompute_coefficients(symbol).await {
                tracing::error!(symbol = %symbol, error = %e, "Coefficient recompute failed");
            }
        }

        // --- Phase 3: scores ---
        for symbol in &ticked {
            let Ok(grid) = grids.grid(symbol) else {
                continue;
            };
            match self.rescore(symbol, grid).await {
                Ok(Some(_)) => summary.scored.push((*symbol).clone()),
                Ok(None) => tracing::debug!(symbol = %symbol, "No observation yet, not scored"),
                Err(e) => tracing::error!(symbol = %symbol, error = %e, "Scoring failed"),
            }
        }

        tracing::info!(
            counted = summary.counted.len(),
            refreshed = summary.refreshed.len(),
            skipped = summary.skipped.len(),
            scored = summary.scored.len(),
            "Daily update finished"
        );
        Ok(summary)
    }

    async fn tick_symbol(
        &self,
        grids: &RiskGridStore,
        symbol: &str,
        date: NaiveDate,
        run_id: Uuid,
    ) -> Result<TickOutcome, EngineError> {
        // No grid means no risk: fail before spending a price request.
        let grid = grids.grid(symbol)?;
        let price = self.fetch_price(symbol).await?;
        self.apply_tick(grid, symbol, price, date, run_id).await
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, EngineError> {
        let unavailable = |reason: String| EngineError::PriceUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let snapshot = tokio::time::timeout(self.price_timeout, self.prices.current_price(symbol))
            .await
            .map_err(|_| unavailable(format!("timed out after {:?}", self.price_timeout)))?
            .map_err(|e| unavailable(e.to_string()))?;

        if snapshot.price <= Decimal::ZERO {
            return Err(unavailable(format!("non-positive price {}", snapshot.price)));
        }
        Ok(snapshot.price)
    }

    /// Converts a price to risk on `grid` and records it as the observation
    /// for `date`. Counting is idempotent on `(symbol, date)`.
    pub async fn apply_tick(
        &self,
        grid: &RiskGrid,
        symbol: &str,
        price: Decimal,
        date: NaiveDate,
        run_id: Uuid,
    ) -> Result<TickOutcome, EngineError> {
        let risk = grid.risk_at(price);
        let tick = self
            .tracker
            .observe(symbol, risk, price, date, run_id, Utc::now());
        let outcome = self.repo.record_daily_tick(&tick).await?;

        tracing::debug!(symbol, %risk, band = tick.band, ?outcome, "Applied tick");
        Ok(outcome)
    }

    /// Full coefficient recompute for one symbol. Returns true if anything changed.
    pub async fn recompute_coefficients(&self, symbol: &str) -> Result<bool, EngineError> {
        let mut record = self.band_record(symbol).await?;
        let changed = self.coefficients.apply(&mut record);
        if changed {
            self.repo
                .save_coefficients(symbol, &record.band_coefficients)
                .await?;
        }
        Ok(changed)
    }

    /// Scores the symbol at its last observed risk and stores the result.
    /// Returns `None` if the symbol has never been ticked.
    pub async fn rescore(
        &self,
        symbol: &str,
        grid: &RiskGrid,
    ) -> Result<Option<SignalReport>, EngineError> {
        let record = self.band_record(symbol).await?;
        if record.current_risk.is_none() {
            return Ok(None);
        }

        let report = self.analytics.evaluate(&record, grid, Utc::now())?;
        self.repo.save_score(&report).await?;
        Ok(Some(report))
    }

    /// Replaces a symbol's band counts with externally supplied ones and
    /// recomputes its coefficients. Creates the record if needed.
    pub async fn seed(
        &self,
        symbol: &str,
        counts: [u32; BAND_COUNT],
        today: NaiveDate,
    ) -> Result<TimeBandRecord, EngineError> {
        self.repo.ensure_tracked(symbol, today).await?;
        let mut record = self.band_record(symbol).await?;

        self.tracker.seed(&mut record, counts);
        self.coefficients.apply(&mut record);
        self.repo.save_band_counts(&record).await?;

        tracing::info!(symbol, total_days = record.total_days, "Seeded band counts");

        match load_grid(self.repo.as_ref(), symbol).await {
            Ok(grid) => {
                self.rescore(symbol, &grid).await?;
            }
            Err(e) => tracing::warn!(symbol, error = %e, "Seeded without rescoring"),
        }
        Ok(record)
    }

    async fn band_record(&self, symbol: &str) -> Result<TimeBandRecord, EngineError> {
        self.repo
            .get_band_record(symbol)
            .await?
            .ok_or_else(|| EngineError::NotTracked(symbol.to_string()))
    }
}
