use core_types::{Portfolio, Trade};
use rust_decimal::Decimal;

pub mod error;
pub mod formula;
pub mod sizer;

// Re-export public types
pub use error::RiskError;
pub use formula::{LOT_DIVISOR, lot_size, risk_amount};
pub use sizer::{FixedFractionalSizer, PositionSize};

/// The interface for turning a portfolio's risk settings into a trade size.
pub trait PositionSizer: Send + Sync {
    /// Sizes a new trade against the portfolio's current balance and risk percentage.
    fn size(&self, portfolio: &Portfolio, stop_loss_points: Decimal) -> Result<PositionSize, RiskError>;

    /// Re-derives `lot_size` after the trade's risk amount or stop-loss was edited.
    fn resize(&self, trade: &mut Trade) -> Result<(), RiskError>;
}
