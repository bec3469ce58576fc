//! # Riskband Analytics
//!
//! The band statistics and signal scoring behind every report.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O. Persistence decides whether a date was already
//!   recorded; this crate only applies the consequences.
//! - **Stateless calculators:** every component is a unit struct whose methods
//!   are deterministic functions of their arguments, which keeps them easy to test.
//!
//! ## Public API
//!
//! - `TimeBandTracker`: applies daily ticks and backfill seeds to a `TimeBandRecord`.
//! - `CoefficientCalculator`: full recompute of the ten rarity coefficients.
//! - `ScoringEngine`: zone score × coefficient, direction and strength.
//! - `TargetFinder`: nearest rarer neighbor band on each side.
//! - `AnalyticsEngine`: combines the above into a `SignalReport`.

pub mod bands;
pub mod coefficient;
pub mod engine;
pub mod error;
pub mod scoring;
pub mod target;

pub use bands::{TimeBandTracker, band_for_risk, band_midpoint};
pub use coefficient::CoefficientCalculator;
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use scoring::{ScoringEngine, base_score, signal_strength, signal_type};
pub use target::TargetFinder;
