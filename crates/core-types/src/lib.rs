pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ChartPeriod, TradeDirection};
pub use error::CoreError;
pub use structs::{
    LOT_DP, MONEY_DP, NewPortfolio, NewTrade, Portfolio, Trade, TradeRecord, TradeUpdate,
    UNKNOWN_INSTRUMENT, to_scale,
};
