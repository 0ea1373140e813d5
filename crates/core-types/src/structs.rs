use crate::enums::TradeDirection;
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used for trades that were logged without an instrument.
pub const UNKNOWN_INSTRUMENT: &str = "unknown";

const MAX_PORTFOLIO_NAME: usize = 100;
const MAX_INSTRUMENT: usize = 20;
const MAX_TIMEFRAME: usize = 10;
const MAX_NOTES: usize = 1000;

/// Decimal places stored for money amounts, stop-loss distances and percentages.
pub const MONEY_DP: u32 = 2;
/// Decimal places stored for lot sizes.
pub const LOT_DP: u32 = 4;

// Exclusive magnitude limits of the storage columns at those scales.
const MAX_BALANCE: Decimal = dec!(10000000000000);
const MAX_TRADE_AMOUNT: Decimal = dec!(100000000);
const MAX_LOT_SIZE: Decimal = dec!(1000000);

/// Rounds half away from zero to `dp` places, the way `NUMERIC` columns store values.
pub fn to_scale(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// A trade row exactly as an external store or export hands it to us.
///
/// Everything the user may leave blank is optional here. Converting into a
/// [`Trade`] folds the gaps into their defaults once, so nothing downstream
/// has to care whether a value was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub trade_date: Option<NaiveDate>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub direction: Option<TradeDirection>,
    #[serde(default)]
    pub risk_amount: Option<Decimal>,
    #[serde(default)]
    pub stop_loss_points: Option<Decimal>,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    #[serde(default)]
    pub result: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A single logged position with its risk, stop-loss, lot size and realized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub trade_date: Option<NaiveDate>,
    /// Never blank: empty labels are stored as `None`.
    pub instrument: Option<String>,
    pub timeframe: Option<String>,
    pub direction: Option<TradeDirection>,
    pub risk_amount: Decimal,
    pub stop_loss_points: Decimal,
    pub lot_size: Decimal,
    /// Realized profit or loss. Zero for breakeven and for trades without a recorded result.
    pub result: Decimal,
    pub notes: Option<String>,
}

impl From<TradeRecord> for Trade {
    fn from(record: TradeRecord) -> Self {
        Self {
            id: record.id,
            portfolio_id: record.portfolio_id,
            created_at: record.created_at,
            trade_date: record.trade_date,
            instrument: non_blank(record.instrument),
            timeframe: non_blank(record.timeframe),
            direction: record.direction,
            risk_amount: record.risk_amount.unwrap_or(Decimal::ZERO),
            stop_loss_points: record.stop_loss_points.unwrap_or(Decimal::ZERO),
            lot_size: record.lot_size.unwrap_or(Decimal::ZERO),
            result: record.result.unwrap_or(Decimal::ZERO),
            notes: non_blank(record.notes),
        }
    }
}

impl Trade {
    /// Builds a freshly logged trade from user input and the sizing computed for it.
    pub fn open(
        portfolio_id: Uuid,
        input: &NewTrade,
        risk_amount: Decimal,
        lot_size: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            portfolio_id,
            created_at,
            trade_date: input.trade_date,
            instrument: non_blank(input.instrument.clone()),
            timeframe: non_blank(input.timeframe.clone()),
            direction: input.direction,
            risk_amount,
            stop_loss_points: input.stop_loss_points,
            lot_size,
            result: input.result.unwrap_or(Decimal::ZERO),
            notes: non_blank(input.notes.clone()),
        }
    }

    /// The grouping label for per-instrument statistics.
    pub fn instrument_label(&self) -> &str {
        self.instrument.as_deref().unwrap_or(UNKNOWN_INSTRUMENT)
    }

    pub fn is_profitable(&self) -> bool {
        self.result > Decimal::ZERO
    }

    /// `|result| / risk_amount`, or `None` when there is no result or no risk to compare against.
    pub fn risk_reward_ratio(&self) -> Option<Decimal> {
        if self.result.is_zero() || self.risk_amount.is_zero() {
            return None;
        }
        Some(self.result.abs() / self.risk_amount)
    }

    /// Checks the derived risk amount and lot size fit their storage columns.
    pub fn check_sizing(&self) -> Result<(), CoreError> {
        check_magnitude("risk_amount", self.risk_amount, MAX_TRADE_AMOUNT)?;
        check_magnitude("lot_size", self.lot_size, MAX_LOT_SIZE)
    }
}

/// User input for logging a new trade. Risk amount and lot size are derived from the portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    #[serde(default)]
    pub trade_date: Option<NaiveDate>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub direction: Option<TradeDirection>,
    pub stop_loss_points: Decimal,
    #[serde(default)]
    pub result: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTrade {
    /// A copy with the amounts rounded to their stored scale.
    pub fn normalized(&self) -> Self {
        Self {
            stop_loss_points: to_scale(self.stop_loss_points, MONEY_DP),
            result: self.result.map(|r| to_scale(r, MONEY_DP)),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.stop_loss_points <= Decimal::ZERO {
            return Err(CoreError::invalid("stop_loss_points", "must be greater than 0"));
        }
        check_magnitude("stop_loss_points", self.stop_loss_points, MAX_TRADE_AMOUNT)?;
        if let Some(result) = self.result {
            check_magnitude("result", result, MAX_TRADE_AMOUNT)?;
        }
        check_len("instrument", self.instrument.as_deref(), MAX_INSTRUMENT)?;
        check_len("timeframe", self.timeframe.as_deref(), MAX_TIMEFRAME)?;
        check_len("notes", self.notes.as_deref(), MAX_NOTES)
    }
}

/// A partial edit of an existing trade. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeUpdate {
    #[serde(default)]
    pub trade_date: Option<NaiveDate>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub direction: Option<TradeDirection>,
    #[serde(default)]
    pub risk_amount: Option<Decimal>,
    #[serde(default)]
    pub stop_loss_points: Option<Decimal>,
    #[serde(default)]
    pub result: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TradeUpdate {
    /// A copy with the amounts rounded to their stored scale.
    pub fn normalized(&self) -> Self {
        let scale = |value: Option<Decimal>| value.map(|v| to_scale(v, MONEY_DP));
        Self {
            risk_amount: scale(self.risk_amount),
            stop_loss_points: scale(self.stop_loss_points),
            result: scale(self.result),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(stop_loss) = self.stop_loss_points {
            if stop_loss <= Decimal::ZERO {
                return Err(CoreError::invalid("stop_loss_points", "must be greater than 0"));
            }
            check_magnitude("stop_loss_points", stop_loss, MAX_TRADE_AMOUNT)?;
        }
        if let Some(risk) = self.risk_amount {
            if risk.is_sign_negative() && !risk.is_zero() {
                return Err(CoreError::invalid("risk_amount", "must not be negative"));
            }
            check_magnitude("risk_amount", risk, MAX_TRADE_AMOUNT)?;
        }
        if let Some(result) = self.result {
            check_magnitude("result", result, MAX_TRADE_AMOUNT)?;
        }
        check_len("instrument", self.instrument.as_deref(), MAX_INSTRUMENT)?;
        check_len("timeframe", self.timeframe.as_deref(), MAX_TIMEFRAME)?;
        check_len("notes", self.notes.as_deref(), MAX_NOTES)
    }

    /// Copies the provided fields onto `trade`. The lot size is left to the caller,
    /// since it has to be re-derived from the new risk and stop-loss.
    pub fn apply(&self, trade: &mut Trade) {
        if let Some(date) = self.trade_date {
            trade.trade_date = Some(date);
        }
        if let Some(instrument) = &self.instrument {
            trade.instrument = non_blank(Some(instrument.clone()));
        }
        if let Some(timeframe) = &self.timeframe {
            trade.timeframe = non_blank(Some(timeframe.clone()));
        }
        if let Some(direction) = self.direction {
            trade.direction = Some(direction);
        }
        if let Some(risk) = self.risk_amount {
            trade.risk_amount = risk;
        }
        if let Some(stop_loss) = self.stop_loss_points {
            trade.stop_loss_points = stop_loss;
        }
        if let Some(result) = self.result {
            trade.result = result;
        }
        if let Some(notes) = &self.notes {
            trade.notes = non_blank(Some(notes.clone()));
        }
    }
}

/// A user's trading account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    /// Percent of balance risked per trade, e.g. `0.5` for 0.5%.
    pub risk_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn open(user_id: Uuid, input: &NewPortfolio, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.trim().to_string(),
            balance: input.initial_balance,
            initial_balance: input.initial_balance,
            risk_percentage: input.risk_percentage,
            created_at,
        }
    }

    pub fn total_pnl(&self) -> Decimal {
        self.balance - self.initial_balance
    }

    pub fn total_pnl_pct(&self) -> Decimal {
        if self.initial_balance.is_zero() {
            return Decimal::ZERO;
        }
        self.total_pnl() / self.initial_balance * dec!(100)
    }

    /// Rolls the balance forward from the initial deposit over the given trade results.
    pub fn rebalance<'a>(&mut self, results: impl IntoIterator<Item = &'a Decimal>) {
        self.balance = self.initial_balance + results.into_iter().sum::<Decimal>();
    }
}

/// User input for creating a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPortfolio {
    pub name: String,
    pub initial_balance: Decimal,
    #[serde(default = "default_risk_percentage")]
    pub risk_percentage: Decimal,
}

fn default_risk_percentage() -> Decimal {
    dec!(0.5)
}

impl NewPortfolio {
    /// A copy with the balance and risk percentage rounded to their stored scale.
    pub fn normalized(&self) -> Self {
        Self {
            initial_balance: to_scale(self.initial_balance, MONEY_DP),
            risk_percentage: to_scale(self.risk_percentage, MONEY_DP),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_PORTFOLIO_NAME {
            return Err(CoreError::invalid("name", "must be 1 to 100 characters"));
        }
        if self.initial_balance <= Decimal::ZERO {
            return Err(CoreError::invalid("initial_balance", "must be greater than 0"));
        }
        check_magnitude("initial_balance", self.initial_balance, MAX_BALANCE)?;
        if self.risk_percentage < dec!(0.1) || self.risk_percentage > dec!(10) {
            return Err(CoreError::invalid("risk_percentage", "must be between 0.1 and 10"));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(CoreError::invalid(field, format!("must be at most {max} characters")))
        }
        _ => Ok(()),
    }
}

fn check_magnitude(field: &str, value: Decimal, limit: Decimal) -> Result<(), CoreError> {
    if value.abs() >= limit {
        return Err(CoreError::invalid(field, format!("must be smaller than {limit} in magnitude")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_json(extra: &str) -> String {
        format!(
            r#"{{
                "id": "6f0c1f76-5c1e-4d8e-9a57-3f3c2b8f0e01",
                "portfolio_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
                "created_at": "2024-05-02T10:15:00Z"{extra}
            }}"#
        )
    }

    #[test]
    fn missing_fields_fold_to_defaults() {
        let record: TradeRecord = serde_json::from_str(&record_json("")).unwrap();
        let trade = Trade::from(record);
        assert_eq!(trade.result, Decimal::ZERO);
        assert_eq!(trade.risk_amount, Decimal::ZERO);
        assert_eq!(trade.instrument, None);
        assert_eq!(trade.instrument_label(), UNKNOWN_INSTRUMENT);
    }

    #[test]
    fn blank_instrument_is_unknown() {
        let json = record_json(r#", "instrument": "  ", "result": -12.5, "direction": "sell""#);
        let trade = Trade::from(serde_json::from_str::<TradeRecord>(&json).unwrap());
        assert_eq!(trade.instrument_label(), UNKNOWN_INSTRUMENT);
        assert_eq!(trade.result, dec!(-12.5));
        assert_eq!(trade.direction, Some(TradeDirection::Sell));
        assert!(!trade.is_profitable());
    }

    #[test]
    fn risk_reward_needs_result_and_risk() {
        let json = record_json(r#", "risk_amount": 50, "result": -75"#);
        let mut trade = Trade::from(serde_json::from_str::<TradeRecord>(&json).unwrap());
        assert_eq!(trade.risk_reward_ratio(), Some(dec!(1.5)));
        trade.result = Decimal::ZERO;
        assert_eq!(trade.risk_reward_ratio(), None);
    }

    #[test]
    fn update_touches_only_given_fields() {
        let json = record_json(r#", "instrument": "XAUUSD", "risk_amount": 50, "stop_loss_points": 25, "notes": "breakout""#);
        let mut trade = Trade::from(serde_json::from_str::<TradeRecord>(&json).unwrap());
        let update = TradeUpdate {
            result: Some(dec!(40)),
            instrument: Some(String::new()),
            ..Default::default()
        };
        update.apply(&mut trade);
        assert_eq!(trade.result, dec!(40));
        assert_eq!(trade.instrument, None);
        assert_eq!(trade.stop_loss_points, dec!(25));
        assert_eq!(trade.notes.as_deref(), Some("breakout"));
    }

    #[test]
    fn update_rejects_non_positive_stop_loss() {
        let update = TradeUpdate {
            stop_loss_points: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn new_portfolio_bounds() {
        let mut input = NewPortfolio {
            name: "Main".into(),
            initial_balance: dec!(10000),
            risk_percentage: dec!(0.5),
        };
        assert!(input.validate().is_ok());
        input.risk_percentage = dec!(12);
        assert!(input.validate().is_err());
        input.risk_percentage = dec!(1);
        input.name = "   ".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn normalized_inputs_round_half_away_from_zero() {
        let input = NewPortfolio {
            name: "Main".into(),
            initial_balance: dec!(1000.005),
            risk_percentage: dec!(0.125),
        }
        .normalized();
        assert_eq!(input.initial_balance, dec!(1000.01));
        assert_eq!(input.risk_percentage, dec!(0.13));

        let trade = NewTrade {
            stop_loss_points: dec!(12.345),
            result: Some(dec!(-7.125)),
            ..Default::default()
        }
        .normalized();
        assert_eq!(trade.stop_loss_points, dec!(12.35));
        assert_eq!(trade.result, Some(dec!(-7.13)));

        let update = TradeUpdate {
            risk_amount: Some(dec!(1.005)),
            ..Default::default()
        }
        .normalized();
        assert_eq!(update.risk_amount, Some(dec!(1.01)));
        assert_eq!(update.stop_loss_points, None);
    }

    #[test]
    fn amounts_must_fit_their_columns() {
        let trade = NewTrade {
            stop_loss_points: dec!(10),
            result: Some(dec!(100000000)),
            ..Default::default()
        };
        assert!(trade.validate().is_err());
        assert!(NewTrade { result: Some(dec!(99999999.99)), ..trade }.validate().is_ok());

        let update = TradeUpdate {
            risk_amount: Some(dec!(250000000)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let portfolio = NewPortfolio {
            name: "Whale".into(),
            initial_balance: dec!(10000000000000),
            risk_percentage: dec!(1),
        };
        assert!(portfolio.validate().is_err());
    }

    #[test]
    fn portfolio_rebalances_from_initial_balance() {
        let input = NewPortfolio {
            name: "Prop".into(),
            initial_balance: dec!(1000),
            risk_percentage: dec!(1),
        };
        let mut portfolio = Portfolio::open(Uuid::new_v4(), &input, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        portfolio.rebalance(&[dec!(150), dec!(-50)]);
        assert_eq!(portfolio.balance, dec!(1100));
        assert_eq!(portfolio.total_pnl(), dec!(100));
        assert_eq!(portfolio.total_pnl_pct(), dec!(10));
    }
}
