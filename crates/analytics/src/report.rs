use crate::indicators::IndicatorReading;
use core_types::ChartPeriod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline statistics for the trade list.
///
/// Every field is zero for an empty trade set. `average_loss` and
/// `largest_loss` keep their sign (they are negative or zero).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_pnl: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
}

/// The dashboard metrics.
///
/// Unlike `SummaryStats::average_loss`, `total_loss` is a magnitude so it can
/// feed the profit factor directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    // I. Profitability
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub profit_factor: Decimal, // 0 when there are no losses
    pub roi: Decimal,

    // II. Per-trade
    pub win_rate: Decimal,
    pub average_trade: Decimal,
    pub average_risk: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,

    // III. Stability
    pub consistency: Decimal,
    pub max_winning_streak: usize,
    pub max_losing_streak: usize,
}

/// Aggregates for all trades sharing one instrument label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentStats {
    pub instrument: String,
    pub trades: usize,
    pub winning_trades: usize,
    pub total_result: Decimal,
    pub win_rate: Decimal,
}

/// One point of the cumulative P&L chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Decimal,
}

/// Everything the presentation layer needs to render a portfolio's analytics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub period: ChartPeriod,
    pub summary: SummaryStats,
    pub metrics: AdvancedMetrics,
    /// Empty when there are no trades, so the dashboard shows neutral cards.
    pub indicators: Vec<IndicatorReading>,
    /// Sorted by trade count, busiest instrument first.
    pub instruments: Vec<InstrumentStats>,
    pub series: Vec<SeriesPoint>,
}
