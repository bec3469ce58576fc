//! # Riskband Database Crate
//!
//! The persistence layer: risk grids, band records, the daily tick history
//! and the latest signal scores.
//!
//! ## Architectural Principles
//!
//! - **Adapter behind a trait:** the engine talks to `RiskRepository` only.
//!   `DbRepository` implements it on PostgreSQL, `MemoryRepository` in process.
//! - **Idempotent ticks:** `band_history(symbol, day)` is the idempotency key.
//!   The insert-or-update on that key tells the tracker whether the day is new,
//!   inside the same transaction that updates the band record.
//! - **Asynchronous & Pooled:** all operations are async over a shared `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `connect_to`: establish the connection pool.
//! - `run_migrations`: apply the embedded schema migrations.
//! - `RiskRepository`: the storage contract.
//! - `DbRepository`, `MemoryRepository`: its two implementations.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

pub use connection::{connect, connect_to, run_migrations};
pub use error::DbError;
pub use memory::MemoryRepository;
pub use repository::DbRepository;
pub use store::RiskRepository;
