use crate::indicators::{Indicator, IndicatorReading};
use crate::instruments::instrument_breakdown;
use crate::math::{consistency_score, mean, percentage, HUNDRED};
use crate::report::{AdvancedMetrics, AnalyticsReport, InstrumentStats, SummaryStats};
use crate::series::EquitySeries;
use crate::streaks::longest_streaks;
use chrono::{DateTime, Utc};
use core_types::{ChartPeriod, Trade};
use rust_decimal::Decimal;

/// A stateless calculator for deriving performance metrics from a portfolio's trades.
///
/// Nothing is cached between calls: every method recomputes from the slice it is
/// given, and none of them can fail. Undefined ratios resolve to zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating a portfolio's analytics.
    ///
    /// # Arguments
    ///
    /// * `trades` - The trades of one portfolio, in any order.
    /// * `initial_balance` - The portfolio's starting balance, used for ROI.
    /// * `period` - The window of the cumulative P&L series.
    /// * `now` - The end of that window.
    pub fn calculate(
        &self,
        trades: &[Trade],
        initial_balance: Decimal,
        period: ChartPeriod,
        now: DateTime<Utc>,
    ) -> AnalyticsReport {
        tracing::debug!(trades = trades.len(), %period, "Calculating analytics");

        let metrics = self.advanced_metrics(trades, initial_balance);
        let indicators = if trades.is_empty() {
            Vec::new()
        } else {
            self.indicators(&metrics)
        };

        AnalyticsReport {
            period,
            summary: self.summary(trades),
            indicators,
            metrics,
            instruments: self.instruments(trades),
            series: self.equity_series(trades, period, now).collect(),
        }
    }

    /// Calculates the headline statistics.
    pub fn summary(&self, trades: &[Trade]) -> SummaryStats {
        let mut summary = SummaryStats {
            total_trades: trades.len(),
            ..Default::default()
        };
        if trades.is_empty() {
            return summary;
        }

        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;

        for trade in trades {
            summary.total_pnl = summary.total_pnl.saturating_add(trade.result);
            if trade.result > Decimal::ZERO {
                summary.winning_trades += 1;
                gross_profit = gross_profit.saturating_add(trade.result);
                summary.largest_win = summary.largest_win.max(trade.result);
            } else if trade.result < Decimal::ZERO {
                summary.losing_trades += 1;
                gross_loss = gross_loss.saturating_add(trade.result);
                summary.largest_loss = summary.largest_loss.min(trade.result);
            }
        }

        summary.win_rate = percentage(summary.winning_trades, summary.total_trades);
        if summary.winning_trades > 0 {
            summary.average_win = gross_profit / Decimal::from(summary.winning_trades);
        }
        // Stays negative: this is the average losing result, not its magnitude.
        if summary.losing_trades > 0 {
            summary.average_loss = gross_loss / Decimal::from(summary.losing_trades);
        }

        summary
    }

    /// Calculates the dashboard metrics, including streaks and the consistency score.
    pub fn advanced_metrics(&self, trades: &[Trade], initial_balance: Decimal) -> AdvancedMetrics {
        let mut metrics = AdvancedMetrics::default();
        if trades.is_empty() {
            return metrics;
        }

        self.calculate_profitability(trades, initial_balance, &mut metrics);
        self.calculate_trade_extremes(trades, &mut metrics);

        let results: Vec<Decimal> = trades.iter().map(|t| t.result).collect();
        metrics.consistency = consistency_score(&results);

        let streaks = longest_streaks(trades);
        metrics.max_winning_streak = streaks.max_winning;
        metrics.max_losing_streak = streaks.max_losing;

        metrics
    }

    /// Per-instrument aggregates, busiest instrument first.
    pub fn instruments(&self, trades: &[Trade]) -> Vec<InstrumentStats> {
        instrument_breakdown(trades)
    }

    /// Grades the four dashboard indicators.
    pub fn indicators(&self, metrics: &AdvancedMetrics) -> Vec<IndicatorReading> {
        Indicator::ALL.iter().map(|i| i.read(metrics)).collect()
    }

    /// The cumulative P&L series for the chart, computed lazily.
    pub fn equity_series<'a>(
        &self,
        trades: &'a [Trade],
        period: ChartPeriod,
        now: DateTime<Utc>,
    ) -> EquitySeries<'a> {
        EquitySeries::new(trades, period, now)
    }

    fn calculate_profitability(
        &self,
        trades: &[Trade],
        initial_balance: Decimal,
        metrics: &mut AdvancedMetrics,
    ) {
        let mut total_pnl = Decimal::ZERO;
        let mut losses = Decimal::ZERO;
        let mut winners = 0usize;

        for trade in trades {
            total_pnl = total_pnl.saturating_add(trade.result);
            if trade.result > Decimal::ZERO {
                metrics.total_profit = metrics.total_profit.saturating_add(trade.result);
                winners += 1;
            } else if trade.result < Decimal::ZERO {
                losses = losses.saturating_add(trade.result);
            }
        }

        metrics.total_loss = losses.abs();
        // A ratio past Decimal's range reads as 0, like a missing one.
        if metrics.total_loss > Decimal::ZERO {
            metrics.profit_factor = metrics
                .total_profit
                .checked_div(metrics.total_loss)
                .unwrap_or(Decimal::ZERO);
        }

        metrics.win_rate = percentage(winners, trades.len());
        metrics.average_trade = total_pnl / Decimal::from(trades.len());

        if initial_balance > Decimal::ZERO {
            metrics.roi = total_pnl
                .checked_div(initial_balance)
                .and_then(|ratio| ratio.checked_mul(HUNDRED))
                .unwrap_or(Decimal::ZERO);
        }
    }

    fn calculate_trade_extremes(&self, trades: &[Trade], metrics: &mut AdvancedMetrics) {
        let risks: Vec<Decimal> = trades.iter().map(|t| t.risk_amount).collect();
        metrics.average_risk = mean(&risks).unwrap_or(Decimal::ZERO);

        let results = trades.iter().map(|t| t.result);
        metrics.best_trade = results.clone().max().unwrap_or(Decimal::ZERO);
        metrics.worst_trade = results.min().unwrap_or(Decimal::ZERO);
    }
}
