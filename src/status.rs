use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};
use core_types::{SignalStrength, SignalType};
use engine::SymbolStatus;

fn header(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold)
}

fn right(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Renders the status overview: one row per tracked symbol.
pub fn render(rows: &[SymbolStatus]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header("Symbol"),
            header("Days"),
            header("Band"),
            header("Band days"),
            header("Risk"),
            header("Price"),
            header("Coef"),
            header("Score"),
            header("Signal"),
            header("Strength"),
            header("Last update (UTC)"),
        ]);

    for SymbolStatus { record, score } in rows {
        let signal = score.as_ref().map(|s| s.signal_type);
        let strength = score.as_ref().map(|s| s.signal_strength);

        let signal_cell = match signal {
            Some(SignalType::Long) => Cell::new("LONG").fg(Color::Green),
            Some(SignalType::Short) => Cell::new("SHORT").fg(Color::Red),
            Some(SignalType::Neutral) => Cell::new("NEUTRAL").fg(Color::DarkGrey),
            None => Cell::new("-"),
        };
        let strength_cell = match strength {
            Some(s @ (SignalStrength::Strong | SignalStrength::Strongest)) => {
                Cell::new(s).add_attribute(Attribute::Bold)
            }
            Some(s) => Cell::new(s),
            None => Cell::new("-"),
        };

        table.add_row(vec![
            Cell::new(&record.symbol),
            right(record.total_days),
            right(or_dash(record.current_band)),
            right(or_dash(record.current_band_count())),
            right(or_dash(record.current_risk.map(|r| r.round_dp(4)))),
            right(or_dash(record.current_price)),
            right(or_dash(record.current_coefficient().map(|c| c.round_dp(3)))),
            right(or_dash(score.as_ref().map(|s| s.total_score.round_dp(1)))),
            signal_cell,
            strength_cell,
            Cell::new(or_dash(
                record
                    .last_update_timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            )),
        ]);
    }

    table
}
