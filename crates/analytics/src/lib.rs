//! # Trade Journal Analytics
//!
//! Turns a portfolio's logged trades into the numbers shown on its dashboard:
//! headline statistics, profitability and stability metrics, graded indicators,
//! a per-instrument breakdown and the cumulative P&L series.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** This crate knows nothing about storage or HTTP. It depends only
//!   on `core-types`.
//! - **Stateless calculation:** `AnalyticsEngine` holds no state. Every report is
//!   recomputed from the full trade list, so identical input always yields an
//!   identical report.
//! - **Infallible:** Undefined ratios (no losses, no trades, zero mean) resolve to
//!   zero instead of erroring.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the calculator.
//! - `AnalyticsReport`: the bundle of everything it produces.
//! - `Indicator` / `Level`: the graded dashboard cards.
//! - `EquitySeries`: a lazy iterator over the cumulative P&L chart.

pub mod engine;
pub mod indicators;
pub mod instruments;
pub mod math;
pub mod report;
pub mod series;
pub mod streaks;

#[cfg(test)]
mod test_support;

pub use engine::AnalyticsEngine;
pub use indicators::{Indicator, IndicatorReading, Level};
pub use report::{AdvancedMetrics, AnalyticsReport, InstrumentStats, SeriesPoint, SummaryStats};
pub use series::EquitySeries;
pub use streaks::Streaks;
