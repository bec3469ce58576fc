pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{SignalStrength, SignalType, TickOutcome};
pub use error::CoreError;
pub use structs::{
    BAND_COUNT, DailyTick, GridPoint, Kline, PriceSnapshot, ScoreRecord, SignalReport,
    TargetSetup, TargetSuggestion, TimeBandRecord, band_index,
};
