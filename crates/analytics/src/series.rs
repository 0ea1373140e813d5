use crate::report::SeriesPoint;
use crate::streaks::chronological;
use chrono::{DateTime, Utc};
use core_types::{ChartPeriod, Trade};
use rust_decimal::Decimal;
use std::vec;

/// Label of the synthetic zero point that opens a non-empty series.
pub const ORIGIN_LABEL: &str = "start";
/// Format of the per-trade date labels, e.g. `02.05.2024`.
pub const DATE_LABEL_FORMAT: &str = "%d.%m.%Y";

/// Cumulative P&L over the trades inside a chart window, oldest first.
///
/// Built fresh from the trade slice on every call and carries no state between
/// calls. Cloning the iterator restarts it from wherever the clone was taken.
#[derive(Debug, Clone)]
pub struct EquitySeries<'a> {
    trades: vec::IntoIter<&'a Trade>,
    cumulative: Decimal,
    origin_pending: bool,
}

impl<'a> EquitySeries<'a> {
    pub fn new(trades: &'a [Trade], period: ChartPeriod, now: DateTime<Utc>) -> Self {
        let cutoff = period.cutoff(now);
        let window = trades
            .iter()
            .filter(|t| cutoff.is_none_or(|start| t.created_at >= start));
        let sorted = chronological(window);

        Self {
            origin_pending: !sorted.is_empty(),
            trades: sorted.into_iter(),
            cumulative: Decimal::ZERO,
        }
    }
}

impl Iterator for EquitySeries<'_> {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.origin_pending {
            self.origin_pending = false;
            return Some(SeriesPoint {
                label: ORIGIN_LABEL.to_string(),
                value: Decimal::ZERO,
            });
        }

        let trade = self.trades.next()?;
        self.cumulative = self.cumulative.saturating_add(trade.result);
        Some(SeriesPoint {
            label: trade.created_at.format(DATE_LABEL_FORMAT).to_string(),
            value: self.cumulative,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.trades.len() + usize::from(self.origin_pending);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EquitySeries<'_> {}
