use crate::error::DbError;
use async_trait::async_trait;
use core_types::{NewPortfolio, NewTrade, Portfolio, Trade, TradeUpdate};
use uuid::Uuid;

/// Portfolio persistence, always scoped to the owning user.
///
/// A portfolio that exists but belongs to someone else is reported as
/// `DbError::NotFound`, exactly like one that does not exist.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn create_portfolio(&self, user_id: Uuid, input: NewPortfolio) -> Result<Portfolio, DbError>;

    /// Newest first.
    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<Portfolio>, DbError>;

    async fn get_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Portfolio, DbError>;
}

/// Trade persistence. Every write recomputes the parent portfolio's balance
/// as `initial_balance + sum(result)` before it returns.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Newest first.
    async fn list_trades(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Vec<Trade>, DbError>;

    /// Sizes the trade from the portfolio's current risk settings and stores it.
    async fn create_trade(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        input: NewTrade,
    ) -> Result<Trade, DbError>;

    /// Applies a partial update and re-derives the lot size.
    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        update: TradeUpdate,
    ) -> Result<Trade, DbError>;

    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<(), DbError>;
}

/// Everything the HTTP layer needs from storage, usable as `Arc<dyn Repository>`.
pub trait Repository: PortfolioStore + TradeStore {}

impl<T: PortfolioStore + TradeStore> Repository for T {}
