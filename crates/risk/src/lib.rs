//! # Riskband Risk Grids
//!
//! Maps prices to normalized risk values (and back) using each symbol's
//! hand-calibrated control points. Interpolation is piecewise-linear between
//! the two bracketing points and clamps to the boundary outside the grid.
//!
//! ## Public API
//!
//! - `RiskGrid`: one symbol's validated control points with `risk_at` / `price_at`.
//! - `RiskGridStore`: all grids keyed by symbol; fails with `GridMissing` for unknown symbols.
//! - `RiskError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod grid;
pub mod store;

pub use error::RiskError;
pub use grid::RiskGrid;
pub use store::RiskGridStore;
