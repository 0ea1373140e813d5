use crate::math::HUNDRED;
use crate::report::AdvancedMetrics;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a dashboard indicator. Ordered so that `Excellent` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Danger,
    Warning,
    Good,
    Excellent,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Danger => "danger",
            Level::Warning => "warning",
            Level::Good => "good",
            Level::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four metrics shown as graded cards on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    WinRate,
    ProfitFactor,
    AverageTrade,
    Consistency,
}

// Highest bound first; the first bound the value reaches wins.
const WIN_RATE_LEVELS: [(Decimal, Level); 3] = [
    (dec!(60), Level::Excellent),
    (dec!(50), Level::Good),
    (dec!(40), Level::Warning),
];
const PROFIT_FACTOR_LEVELS: [(Decimal, Level); 3] = [
    (dec!(2), Level::Excellent),
    (dec!(1.5), Level::Good),
    (dec!(1), Level::Warning),
];
const AVERAGE_TRADE_LEVELS: [(Decimal, Level); 3] = [
    (dec!(50), Level::Excellent),
    (dec!(10), Level::Good),
    (dec!(0), Level::Warning),
];
const CONSISTENCY_LEVELS: [(Decimal, Level); 3] = [
    (dec!(80), Level::Excellent),
    (dec!(60), Level::Good),
    (dec!(40), Level::Warning),
];

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::WinRate,
        Indicator::ProfitFactor,
        Indicator::AverageTrade,
        Indicator::Consistency,
    ];

    pub fn thresholds(&self) -> &'static [(Decimal, Level)] {
        match self {
            Indicator::WinRate => &WIN_RATE_LEVELS,
            Indicator::ProfitFactor => &PROFIT_FACTOR_LEVELS,
            Indicator::AverageTrade => &AVERAGE_TRADE_LEVELS,
            Indicator::Consistency => &CONSISTENCY_LEVELS,
        }
    }

    pub fn classify(&self, value: Decimal) -> Level {
        self.thresholds()
            .iter()
            .find(|(bound, _)| value >= *bound)
            .map_or(Level::Danger, |(_, level)| *level)
    }

    /// Fill of the card's progress bar, in `[0, 100]` for any non-negative rate.
    pub fn progress(&self, value: Decimal) -> Decimal {
        match self {
            Indicator::WinRate | Indicator::Consistency => value.min(HUNDRED),
            Indicator::ProfitFactor => (value / dec!(3)).saturating_mul(HUNDRED).min(HUNDRED),
            Indicator::AverageTrade => (value.saturating_add(HUNDRED) / Decimal::TWO)
                .max(Decimal::ZERO)
                .min(HUNDRED),
        }
    }

    pub fn value_of(&self, metrics: &AdvancedMetrics) -> Decimal {
        match self {
            Indicator::WinRate => metrics.win_rate,
            Indicator::ProfitFactor => metrics.profit_factor,
            Indicator::AverageTrade => metrics.average_trade,
            Indicator::Consistency => metrics.consistency,
        }
    }

    pub fn read(&self, metrics: &AdvancedMetrics) -> IndicatorReading {
        let value = self.value_of(metrics);
        IndicatorReading {
            indicator: *self,
            value,
            level: self.classify(value),
            progress: self.progress(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub indicator: Indicator,
    pub value: Decimal,
    pub level: Level,
    pub progress: Decimal,
}
