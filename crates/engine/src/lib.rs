//! The orchestration layer: wires the price source, the grids, the band
//! tracker and storage into the daily update, backfill and query services.

pub mod backfill;
pub mod error;
pub mod grids;
pub mod query;
pub mod schedule;
pub mod updater;

pub use backfill::{BACKFILL_INTERVAL, BackfillSummary, default_start, monthly_ranges};
pub use error::EngineError;
pub use query::{RiskService, SymbolStatus};
pub use schedule::{next_run_after, run_daily};
pub use updater::{DailyUpdater, RunSummary, SkippedSymbol};
