//! Sizing and column-scale rules shared by every store implementation.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use core_types::{LOT_DP, MONEY_DP, NewPortfolio, NewTrade, Portfolio, Trade, TradeUpdate, to_scale};
use risk::PositionSizer;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Builds a new portfolio from input rounded to the stored scale.
pub fn open_portfolio(user_id: Uuid, input: &NewPortfolio, now: DateTime<Utc>) -> Result<Portfolio, DbError> {
    let input = input.normalized();
    input.validate()?;
    Ok(Portfolio::open(user_id, &input, now))
}

/// Builds a new trade sized against the portfolio's current balance.
///
/// The stop loss is rounded before sizing, so the lot size always matches the
/// stored distance.
pub fn open_trade(
    sizer: &dyn PositionSizer,
    portfolio: &Portfolio,
    input: &NewTrade,
    now: DateTime<Utc>,
) -> Result<Trade, DbError> {
    let input = input.normalized();
    input.validate()?;
    let size = sizer.size(portfolio, input.stop_loss_points)?;
    let trade = Trade::open(
        portfolio.id,
        &input,
        to_scale(size.risk_amount, MONEY_DP),
        to_scale(size.lot_size, LOT_DP),
        now,
    );
    trade.check_sizing()?;
    Ok(trade)
}

/// Applies `update` in place. The lot size follows the edited risk and stop loss.
pub fn amend_trade(sizer: &dyn PositionSizer, trade: &mut Trade, update: &TradeUpdate) -> Result<(), DbError> {
    let update = update.normalized();
    update.validate()?;
    update.apply(trade);
    if trade.stop_loss_points > Decimal::ZERO {
        sizer.resize(trade)?;
        trade.lot_size = to_scale(trade.lot_size, LOT_DP);
    }
    trade.check_sizing()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{CoreError, NewPortfolio};
    use risk::FixedFractionalSizer;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn portfolio(balance: Decimal) -> Portfolio {
        let input = NewPortfolio {
            name: "Main".into(),
            initial_balance: balance,
            risk_percentage: dec!(0.5),
        };
        Portfolio::open(Uuid::new_v4(), &input, Utc::now())
    }

    fn new_trade(stop_loss: Decimal) -> NewTrade {
        NewTrade {
            instrument: Some("XAUUSD".into()),
            stop_loss_points: stop_loss,
            result: Some(dec!(12.345)),
            ..Default::default()
        }
    }

    #[test]
    fn open_sizes_from_current_balance() {
        let sizer = FixedFractionalSizer::new();
        let trade = open_trade(&sizer, &portfolio(dec!(20000)), &new_trade(dec!(50)), Utc::now()).unwrap();
        assert_eq!(trade.risk_amount, dec!(100));
        assert_eq!(trade.lot_size, dec!(0.2));
        assert_eq!(trade.result, dec!(12.35));
    }

    #[test]
    fn open_rounds_lot_to_four_places() {
        let sizer = FixedFractionalSizer::new();
        // risk 33.335, lot 33.335 / 70 = 0.476214...
        let trade = open_trade(&sizer, &portfolio(dec!(6667)), &new_trade(dec!(7)), Utc::now()).unwrap();
        assert_eq!(trade.risk_amount, dec!(33.34));
        assert_eq!(trade.lot_size, dec!(0.4762));
    }

    #[test]
    fn open_rejects_zero_stop_loss() {
        let sizer = FixedFractionalSizer::new();
        let err = open_trade(&sizer, &portfolio(dec!(1000)), &new_trade(Decimal::ZERO), Utc::now()).unwrap_err();
        assert!(matches!(err, DbError::Validation(CoreError::InvalidInput(..))));
    }

    #[test]
    fn amend_recomputes_lot_from_edited_fields() {
        let sizer = FixedFractionalSizer::new();
        let mut trade = open_trade(&sizer, &portfolio(dec!(20000)), &new_trade(dec!(50)), Utc::now()).unwrap();

        let update = TradeUpdate {
            stop_loss_points: Some(dec!(25)),
            ..Default::default()
        };
        amend_trade(&sizer, &mut trade, &update).unwrap();
        assert_eq!(trade.lot_size, dec!(0.4));

        let update = TradeUpdate {
            risk_amount: Some(dec!(50)),
            ..Default::default()
        };
        amend_trade(&sizer, &mut trade, &update).unwrap();
        assert_eq!(trade.lot_size, dec!(0.2));
    }

    #[test]
    fn stop_loss_is_rounded_before_sizing() {
        let sizer = FixedFractionalSizer::new();
        // risk 100, stop 12.345 -> 12.35, lot 100 / 123.5 = 0.80971...
        let trade = open_trade(&sizer, &portfolio(dec!(20000)), &new_trade(dec!(12.345)), Utc::now()).unwrap();
        assert_eq!(trade.stop_loss_points, dec!(12.35));
        assert_eq!(trade.lot_size, dec!(0.8097));
    }

    #[test]
    fn amend_rounds_edited_amounts() {
        let sizer = FixedFractionalSizer::new();
        let mut trade = open_trade(&sizer, &portfolio(dec!(20000)), &new_trade(dec!(50)), Utc::now()).unwrap();
        let update = TradeUpdate {
            risk_amount: Some(dec!(99.995)),
            stop_loss_points: Some(dec!(49.996)),
            result: Some(dec!(-0.005)),
            ..Default::default()
        };
        amend_trade(&sizer, &mut trade, &update).unwrap();
        assert_eq!(trade.risk_amount, dec!(100));
        assert_eq!(trade.stop_loss_points, dec!(50));
        assert_eq!(trade.result, dec!(-0.01));
        assert_eq!(trade.lot_size, dec!(0.2));
    }

    #[test]
    fn derived_sizes_must_fit_their_columns() {
        let sizer = FixedFractionalSizer::new();
        // 0.5% of 1e12 is 5e9, past the risk column
        let err = open_trade(&sizer, &portfolio(dec!(1000000000000)), &new_trade(dec!(50)), Utc::now()).unwrap_err();
        assert!(matches!(err, DbError::Validation(CoreError::InvalidInput(ref field, _)) if field == "risk_amount"));
    }

    #[test]
    fn open_portfolio_rounds_before_validating() {
        let input = NewPortfolio {
            name: " Main ".into(),
            initial_balance: dec!(1000.005),
            risk_percentage: dec!(0.125),
        };
        let portfolio = open_portfolio(Uuid::new_v4(), &input, Utc::now()).unwrap();
        assert_eq!(portfolio.initial_balance, dec!(1000.01));
        assert_eq!(portfolio.balance, dec!(1000.01));
        assert_eq!(portfolio.risk_percentage, dec!(0.13));

        // 0.094 stores as 0.09, below the minimum
        let input = NewPortfolio { risk_percentage: dec!(0.094), ..input };
        assert!(open_portfolio(Uuid::new_v4(), &input, Utc::now()).is_err());
    }

    #[test]
    fn amend_rejects_non_positive_stop_loss() {
        let sizer = FixedFractionalSizer::new();
        let mut trade = open_trade(&sizer, &portfolio(dec!(20000)), &new_trade(dec!(50)), Utc::now()).unwrap();
        let before = trade.clone();
        let update = TradeUpdate {
            stop_loss_points: Some(dec!(-5)),
            ..Default::default()
        };
        assert!(amend_trade(&sizer, &mut trade, &update).is_err());
        assert_eq!(trade, before);
    }
}
