use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Stop-loss must be greater than 0 points, got {0}.")]
    InvalidStopLoss(Decimal),

    #[error("Risk amount must not be negative, got {0}.")]
    InvalidRisk(Decimal),

    #[error("Portfolio balance ({0}) must be greater than 0 to size a position.")]
    InvalidBalance(Decimal),

    #[error("Risk percentage must be greater than 0, got {0}.")]
    InvalidRiskPercentage(Decimal),
}
