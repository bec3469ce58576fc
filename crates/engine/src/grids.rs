use crate::error::EngineError;
use core_types::GridPoint;
use database::RiskRepository;
use risk::{RiskError, RiskGrid, RiskGridStore};

/// Loads one symbol's grid, failing with `GridMissing` when none is stored.
pub async fn load_grid(repo: &dyn RiskRepository, symbol: &str) -> Result<RiskGrid, EngineError> {
    let points = repo.load_grid(symbol).await?;
    if points.is_empty() {
        return Err(RiskError::GridMissing(symbol.to_string()).into());
    }
    Ok(RiskGrid::new(symbol, points)?)
}

/// Loads every stored grid. A grid that fails validation is logged and left
/// out, so one bad import cannot block the other symbols.
pub async fn load_grid_store(repo: &dyn RiskRepository) -> Result<RiskGridStore, EngineError> {
    let (store, rejected) = RiskGridStore::from_points(repo.load_grid_points().await?);
    for e in &rejected {
        tracing::error!(error = %e, "Stored grid is invalid");
    }
    tracing::debug!(grids = store.len(), rejected = rejected.len(), "Loaded risk grids");
    Ok(store)
}

/// Validates and stores a full replacement grid for `symbol`.
/// An invalid grid is rejected before anything is written.
pub async fn import_grid(
    repo: &dyn RiskRepository,
    symbol: &str,
    points: Vec<GridPoint>,
) -> Result<RiskGrid, EngineError> {
    let grid = RiskGrid::new(symbol, points)?;
    repo.replace_grid(symbol, grid.points()).await?;
    tracing::info!(symbol, points = grid.points().len(), "Imported risk grid");
    Ok(grid)
}
