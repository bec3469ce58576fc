use crate::error::RiskError;
use crate::grid::RiskGrid;
use core_types::GridPoint;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// All loaded risk grids, keyed by symbol.
///
/// Read-only once built; a re-import replaces a symbol's grid wholesale.
#[derive(Debug, Clone, Default)]
pub struct RiskGridStore {
    grids: HashMap<String, RiskGrid>,
}

impl RiskGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a flat list of points spanning any number of symbols.
    ///
    /// Symbols whose points do not form a valid grid are left out of the
    /// store and their errors are returned alongside it.
    pub fn from_points(points: Vec<GridPoint>) -> (Self, Vec<RiskError>) {
        let mut by_symbol: BTreeMap<String, Vec<GridPoint>> = BTreeMap::new();
        for point in points {
            by_symbol.entry(point.symbol.clone()).or_default().push(point);
        }

        let mut store = Self::new();
        let mut rejected = Vec::new();
        for (symbol, points) in by_symbol {
            match RiskGrid::new(symbol, points) {
                Ok(grid) => {
                    store.insert(grid);
                }
                Err(e) => rejected.push(e),
            }
        }
        (store, rejected)
    }

    /// Inserts or replaces a symbol's grid, returning the previous one.
    pub fn insert(&mut self, grid: RiskGrid) -> Option<RiskGrid> {
        self.grids.insert(grid.symbol().to_string(), grid)
    }

    pub fn grid(&self, symbol: &str) -> Result<&RiskGrid, RiskError> {
        self.grids
            .get(symbol)
            .ok_or_else(|| RiskError::GridMissing(symbol.to_string()))
    }

    /// `riskAt`: the risk value of `price` on the symbol's grid.
    pub fn risk_at(&self, symbol: &str, price: Decimal) -> Result<Decimal, RiskError> {
        Ok(self.grid(symbol)?.risk_at(price))
    }

    /// `priceAt`: the price corresponding to `risk` on the symbol's grid.
    pub fn price_at(&self, symbol: &str, risk: Decimal) -> Result<Decimal, RiskError> {
        Ok(self.grid(symbol)?.price_at(risk))
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn points() -> Vec<GridPoint> {
        vec![
            GridPoint::new("BTCUSDT", dec!(15000), dec!(0)),
            GridPoint::new("ETHUSDT", dec!(4800), dec!(1)),
            GridPoint::new("BTCUSDT", dec!(130000), dec!(1)),
            GridPoint::new("ETHUSDT", dec!(90), dec!(0)),
        ]
    }

    #[test]
    fn groups_points_by_symbol() {
        let (store, rejected) = RiskGridStore::from_points(points());
        assert!(rejected.is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.grid("BTCUSDT").unwrap().points().len(), 2);
        assert_eq!(store.grid("ETHUSDT").unwrap().points().len(), 2);
    }

    #[test]
    fn missing_symbol_is_grid_missing() {
        let (store, _) = RiskGridStore::from_points(points());
        assert_eq!(
            store.risk_at("SOLUSDT", dec!(100)),
            Err(RiskError::GridMissing("SOLUSDT".to_string()))
        );
        assert_eq!(
            store.price_at("SOLUSDT", dec!(0.5)),
            Err(RiskError::GridMissing("SOLUSDT".to_string()))
        );
    }

    #[test]
    fn bad_symbol_is_left_out_without_blocking_others() {
        let mut points = points();
        points.push(GridPoint::new("DOGEUSDT", dec!(0.1), dec!(0.5)));

        let (store, rejected) = RiskGridStore::from_points(points);

        assert_eq!(store.len(), 2);
        assert!(store.grid("BTCUSDT").is_ok());
        assert!(store.grid("DOGEUSDT").is_err());
        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            &rejected[0],
            RiskError::InvalidGrid { symbol, .. } if symbol == "DOGEUSDT"
        ));
    }

    #[test]
    fn insert_replaces_existing_grid() {
        let (mut store, _) = RiskGridStore::from_points(points());
        let replacement = RiskGrid::new(
            "BTCUSDT",
            vec![
                GridPoint::new("BTCUSDT", dec!(10000), dec!(0)),
                GridPoint::new("BTCUSDT", dec!(20000), dec!(1)),
            ],
        )
        .unwrap();

        let previous = store.insert(replacement);
        assert!(previous.is_some());
        assert_eq!(store.risk_at("BTCUSDT", dec!(15000)).unwrap(), dec!(0.5));
    }
}
