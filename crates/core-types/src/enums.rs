use crate::error::CoreError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeDirection::Buy),
            "sell" => Ok(TradeDirection::Sell),
            other => Err(CoreError::invalid(
                "direction",
                format!("expected 'buy' or 'sell', got '{other}'"),
            )),
        }
    }
}

/// The time window selected for the cumulative P&L chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartPeriod {
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "all")]
    All,
}

impl ChartPeriod {
    pub const ALL: [ChartPeriod; 4] = [
        ChartPeriod::SevenDays,
        ChartPeriod::OneMonth,
        ChartPeriod::ThreeMonths,
        ChartPeriod::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPeriod::SevenDays => "7d",
            ChartPeriod::OneMonth => "1m",
            ChartPeriod::ThreeMonths => "3m",
            ChartPeriod::All => "all",
        }
    }

    /// The earliest `created_at` still inside the window ending at `now`.
    ///
    /// Month windows step back by calendar months and keep the time of day of `now`.
    /// Returns `None` for `All`, which applies no lower bound.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ChartPeriod::SevenDays => Some(now - Duration::days(7)),
            ChartPeriod::OneMonth => Some(now.checked_sub_months(Months::new(1)).unwrap_or(now)),
            ChartPeriod::ThreeMonths => Some(now.checked_sub_months(Months::new(3)).unwrap_or(now)),
            ChartPeriod::All => None,
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartPeriod::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::invalid("period", format!("expected one of 7d, 1m, 3m, all; got '{s}'"))
            })
    }
}
