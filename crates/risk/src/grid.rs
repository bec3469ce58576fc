use crate::error::RiskError;
use core_types::GridPoint;
use rust_decimal::Decimal;
use serde::Serialize;

/// The validated price/risk control points of one symbol.
///
/// Points are kept sorted by risk. Because price is strictly increasing in
/// risk, the same ordering is also sorted by price, so one vector serves
/// lookups on both axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskGrid {
    symbol: String,
    points: Vec<GridPoint>,
}

impl RiskGrid {
    /// Validates and sorts a symbol's control points.
    ///
    /// Requires at least two points, positive prices, risks inside `[0, 1]`,
    /// unique risks, and prices that strictly increase with risk.
    pub fn new(symbol: impl Into<String>, mut points: Vec<GridPoint>) -> Result<Self, RiskError> {
        let symbol = symbol.into();
        let invalid = |reason: String| RiskError::InvalidGrid {
            symbol: symbol.clone(),
            reason,
        };

        if points.len() < 2 {
            return Err(invalid(format!(
                "at least 2 points are required, got {}",
                points.len()
            )));
        }
        for point in &points {
            if point.price <= Decimal::ZERO {
                return Err(invalid(format!("price {} is not positive", point.price)));
            }
            if point.risk < Decimal::ZERO || point.risk > Decimal::ONE {
                return Err(invalid(format!("risk {} is outside [0, 1]", point.risk)));
            }
        }

        points.sort_by(|a, b| a.risk.cmp(&b.risk));
        for pair in points.windows(2) {
            if pair[0].risk == pair[1].risk {
                return Err(invalid(format!("risk {} appears twice", pair[0].risk)));
            }
            if pair[1].price <= pair[0].price {
                return Err(invalid(format!(
                    "price must increase with risk, but risk {} -> {} maps {} -> {}",
                    pair[0].risk, pair[1].risk, pair[0].price, pair[1].price
                )));
            }
        }

        let (first, last) = (&points[0], &points[points.len() - 1]);
        if first.risk != Decimal::ZERO || last.risk != Decimal::ONE {
            tracing::warn!(
                symbol = %symbol,
                min_risk = %first.risk,
                max_risk = %last.risk,
                "Risk grid does not span 0.0..=1.0; queries outside it will clamp early."
            );
        }

        for point in &mut points {
            point.symbol.clone_from(&symbol);
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Control points, sorted ascending by risk and by price.
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    /// Lowest and highest price covered by the grid.
    pub fn price_range(&self) -> (Decimal, Decimal) {
        (self.points[0].price, self.points[self.points.len() - 1].price)
    }

    /// Risk value for a price. Prices outside the grid clamp to the boundary risk.
    pub fn risk_at(&self, price: Decimal) -> Decimal {
        interpolate(&self.points, price, |p| p.price, |p| p.risk)
    }

    /// Price for a risk value. Risks outside the grid clamp to the boundary price.
    pub fn price_at(&self, risk: Decimal) -> Decimal {
        interpolate(&self.points, risk, |p| p.risk, |p| p.price)
    }
}

/// Piecewise-linear lookup over points sorted ascending on both axes.
///
/// `points` must hold at least one element, which `RiskGrid::new` guarantees.
fn interpolate(
    points: &[GridPoint],
    query: Decimal,
    input: impl Fn(&GridPoint) -> Decimal,
    output: impl Fn(&GridPoint) -> Decimal,
) -> Decimal {
    let first = &points[0];
    let last = &points[points.len() - 1];

    if query <= input(first) {
        return output(first);
    }
    if query >= input(last) {
        return output(last);
    }

    // first < query < last, so `upper` is in 1..len.
    let upper = points.partition_point(|p| input(p) < query);
    let high = &points[upper];
    let high_in = input(high);
    if high_in == query {
        return output(high);
    }

    let low = &points[upper - 1];
    let low_in = input(low);
    if low_in == high_in {
        return output(low);
    }

    let (low_out, high_out) = (output(low), output(high));
    low_out + (high_out - low_out) * (query - low_in) / (high_in - low_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(price: Decimal, risk: Decimal) -> GridPoint {
        GridPoint::new("TEST", price, risk)
    }

    fn two_point_grid() -> RiskGrid {
        RiskGrid::new(
            "BNBUSDT",
            vec![point(dec!(20.61), dec!(0.0)), point(dec!(933.79), dec!(1.0))],
        )
        .unwrap()
    }

    fn btc_like_grid() -> RiskGrid {
        RiskGrid::new(
            "BTCUSDT",
            vec![
                point(dec!(15000), dec!(0.0)),
                point(dec!(25000), dec!(0.2)),
                point(dec!(40000), dec!(0.45)),
                point(dec!(60000), dec!(0.7)),
                point(dec!(90000), dec!(0.9)),
                point(dec!(130000), dec!(1.0)),
            ],
        )
        .unwrap()
    }

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn two_point_grid_interpolates_midpoint() {
        let grid = two_point_grid();
        assert_close(grid.risk_at(dec!(477.2)), dec!(0.5), dec!(0.0001));
        assert_close(grid.price_at(dec!(0.5)), dec!(477.2), dec!(0.01));
    }

    #[test]
    fn clamps_outside_grid_range() {
        let grid = btc_like_grid();
        assert_eq!(grid.risk_at(dec!(1)), dec!(0.0));
        assert_eq!(grid.risk_at(dec!(500000)), dec!(1.0));
        assert_eq!(grid.price_at(dec!(-0.5)), dec!(15000));
        assert_eq!(grid.price_at(dec!(1.5)), dec!(130000));
    }

    #[test]
    fn exact_control_point_returns_its_value() {
        let grid = btc_like_grid();
        assert_eq!(grid.risk_at(dec!(40000)), dec!(0.45));
        assert_eq!(grid.price_at(dec!(0.7)), dec!(60000));
    }

    #[test]
    fn interpolates_inside_a_segment() {
        let grid = btc_like_grid();
        // Halfway between 25000 (0.2) and 40000 (0.45).
        assert_eq!(grid.risk_at(dec!(32500)), dec!(0.325));
        assert_eq!(grid.price_at(dec!(0.325)), dec!(32500));
    }

    #[test]
    fn risk_is_monotonic_in_price() {
        let grid = btc_like_grid();
        let mut previous = grid.risk_at(dec!(10000));
        let mut price = dec!(10000);
        while price <= dec!(140000) {
            let risk = grid.risk_at(price);
            assert!(risk >= previous, "risk fell from {previous} to {risk} at {price}");
            previous = risk;
            price += dec!(1250);
        }
    }

    #[test]
    fn price_round_trips_through_risk() {
        let grid = btc_like_grid();
        for price in [dec!(15000), dec!(18123.45), dec!(41000), dec!(77777), dec!(129999)] {
            let back = grid.price_at(grid.risk_at(price));
            assert_close(back, price, dec!(0.0001));
        }
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let grid = RiskGrid::new(
            "ETHUSDT",
            vec![
                point(dec!(4000), dec!(1.0)),
                point(dec!(100), dec!(0.0)),
                point(dec!(1500), dec!(0.5)),
            ],
        )
        .unwrap();
        let risks: Vec<_> = grid.points().iter().map(|p| p.risk).collect();
        assert_eq!(risks, vec![dec!(0.0), dec!(0.5), dec!(1.0)]);
        assert!(grid.points().iter().all(|p| p.symbol == "ETHUSDT"));
        assert_eq!(grid.price_range(), (dec!(100), dec!(4000)));
    }

    #[test]
    fn rejects_single_point() {
        let err = RiskGrid::new("X", vec![point(dec!(1), dec!(0.5))]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidGrid { .. }));
    }

    #[test]
    fn rejects_duplicate_risk() {
        let err = RiskGrid::new(
            "X",
            vec![point(dec!(1), dec!(0.5)), point(dec!(2), dec!(0.5))],
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidGrid { .. }));
    }

    #[test]
    fn rejects_non_monotonic_prices() {
        let err = RiskGrid::new(
            "X",
            vec![
                point(dec!(10), dec!(0.0)),
                point(dec!(30), dec!(0.5)),
                point(dec!(20), dec!(1.0)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidGrid { .. }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(RiskGrid::new("X", vec![point(dec!(0), dec!(0)), point(dec!(1), dec!(1))]).is_err());
        assert!(RiskGrid::new("X", vec![point(dec!(1), dec!(0)), point(dec!(2), dec!(1.2))]).is_err());
    }
}
