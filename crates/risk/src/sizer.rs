use crate::error::RiskError;
use crate::formula::{lot_size, risk_amount};
use crate::PositionSizer;
use core_types::{Portfolio, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The outcome of sizing one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSize {
    pub risk_amount: Decimal,
    pub stop_loss_points: Decimal,
    pub lot_size: Decimal,
}

/// Sizes every trade by risking a fixed fraction of the current portfolio balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFractionalSizer;

impl FixedFractionalSizer {
    pub fn new() -> Self {
        Self
    }

    /// Sizes a position straight from a balance and risk percentage, without a stored portfolio.
    pub fn size_for_balance(
        &self,
        balance: Decimal,
        risk_percentage: Decimal,
        stop_loss_points: Decimal,
    ) -> Result<PositionSize, RiskError> {
        let risk = risk_amount(balance, risk_percentage)?;
        let lot = lot_size(risk, stop_loss_points)?;
        tracing::debug!(%balance, %risk_percentage, %risk, %stop_loss_points, %lot, "Sized position");
        Ok(PositionSize {
            risk_amount: risk,
            stop_loss_points,
            lot_size: lot,
        })
    }
}

impl PositionSizer for FixedFractionalSizer {
    fn size(&self, portfolio: &Portfolio, stop_loss_points: Decimal) -> Result<PositionSize, RiskError> {
        self.size_for_balance(portfolio.balance, portfolio.risk_percentage, stop_loss_points)
    }

    fn resize(&self, trade: &mut Trade) -> Result<(), RiskError> {
        trade.lot_size = lot_size(trade.risk_amount, trade.stop_loss_points)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{NewPortfolio, NewTrade};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn portfolio(balance: Decimal, risk_percentage: Decimal) -> Portfolio {
        let input = NewPortfolio {
            name: "Demo".into(),
            initial_balance: balance,
            risk_percentage,
        };
        Portfolio::open(Uuid::new_v4(), &input, Utc::now())
    }

    #[test]
    fn sizes_from_portfolio_balance() {
        let sizer = FixedFractionalSizer::new();
        let size = sizer.size(&portfolio(dec!(20000), dec!(0.5)), dec!(50)).unwrap();
        assert_eq!(size.risk_amount, dec!(100));
        assert_eq!(size.lot_size, dec!(0.2));
    }

    #[test]
    fn resize_uses_edited_risk_and_stop() {
        let sizer = FixedFractionalSizer::new();
        let input = NewTrade {
            stop_loss_points: dec!(50),
            ..Default::default()
        };
        let mut trade = Trade::open(Uuid::new_v4(), &input, dec!(100), dec!(0.2), Utc::now());
        trade.stop_loss_points = dec!(25);
        trade.risk_amount = dec!(150);
        sizer.resize(&mut trade).unwrap();
        assert_eq!(trade.lot_size, dec!(0.6));
    }

    #[test]
    fn zero_stop_loss_is_rejected() {
        let sizer = FixedFractionalSizer::new();
        let err = sizer.size(&portfolio(dec!(1000), dec!(1)), Decimal::ZERO).unwrap_err();
        assert_eq!(err, RiskError::InvalidStopLoss(Decimal::ZERO));
    }
}
