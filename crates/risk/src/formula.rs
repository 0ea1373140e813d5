use crate::error::RiskError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Points-to-lot conversion constant: `lot = risk / stop_loss_points / 10`.
pub const LOT_DIVISOR: Decimal = dec!(10);

/// Computes the position size for a given monetary risk and stop-loss distance.
///
/// The same function sizes a new trade and re-sizes an edited one, so the
/// divisor must never drift between the two paths.
pub fn lot_size(risk: Decimal, stop_loss_points: Decimal) -> Result<Decimal, RiskError> {
    if stop_loss_points <= Decimal::ZERO {
        return Err(RiskError::InvalidStopLoss(stop_loss_points));
    }
    if risk < Decimal::ZERO {
        return Err(RiskError::InvalidRisk(risk));
    }
    Ok(risk / stop_loss_points / LOT_DIVISOR)
}

/// The monetary amount to risk per trade: `balance * risk_percentage / 100`.
pub fn risk_amount(balance: Decimal, risk_percentage: Decimal) -> Result<Decimal, RiskError> {
    if balance <= Decimal::ZERO {
        return Err(RiskError::InvalidBalance(balance));
    }
    if risk_percentage <= Decimal::ZERO {
        return Err(RiskError::InvalidRiskPercentage(risk_percentage));
    }
    Ok(balance * risk_percentage / Decimal::ONE_HUNDRED)
}
