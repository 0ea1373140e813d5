use crate::math::percentage;
use crate::report::InstrumentStats;
use core_types::Trade;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Groups trades by instrument label, busiest instrument first.
///
/// Groups with the same trade count stay in the order their first trade was seen.
pub fn instrument_breakdown(trades: &[Trade]) -> Vec<InstrumentStats> {
    let mut groups: Vec<InstrumentStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for trade in trades {
        let label = trade.instrument_label();
        let slot = *index.entry(label).or_insert_with(|| {
            groups.push(InstrumentStats {
                instrument: label.to_string(),
                trades: 0,
                winning_trades: 0,
                total_result: Decimal::ZERO,
                win_rate: Decimal::ZERO,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.trades += 1;
        group.total_result = group.total_result.saturating_add(trade.result);
        if trade.is_profitable() {
            group.winning_trades += 1;
        }
    }

    for group in &mut groups {
        group.win_rate = percentage(group.winning_trades, group.trades);
    }

    // `sort_by` is stable, which keeps first-encounter order among ties.
    groups.sort_by(|a, b| b.trades.cmp(&a.trades));
    groups
}
