use crate::error::DbError;
use crate::lifecycle::{amend_trade, open_portfolio, open_trade};
use crate::store::{PortfolioStore, TradeStore};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{NewPortfolio, NewTrade, Portfolio, Trade, TradeUpdate};
use risk::FixedFractionalSizer;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A process-local store used by tests and `serve --memory`.
///
/// Both collections sit behind one lock so a trade write and the balance
/// recomputation it triggers are observed together. Rows are kept in
/// insertion order, which makes "newest first" a reverse scan.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    sizer: FixedFractionalSizer,
}

#[derive(Debug, Default)]
struct State {
    portfolios: Vec<Portfolio>,
    trades: Vec<Trade>,
}

impl State {
    fn portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<&Portfolio, DbError> {
        self.portfolios
            .iter()
            .find(|p| p.id == portfolio_id && p.user_id == user_id)
            .ok_or(DbError::NotFound)
    }

    fn owns(&self, user_id: Uuid, portfolio_id: Uuid) -> bool {
        self.portfolio(user_id, portfolio_id).is_ok()
    }

    /// Index of a trade whose portfolio belongs to `user_id`.
    fn trade_index(&self, user_id: Uuid, trade_id: Uuid) -> Result<usize, DbError> {
        self.trades
            .iter()
            .position(|t| t.id == trade_id && self.owns(user_id, t.portfolio_id))
            .ok_or(DbError::NotFound)
    }

    fn rebalance(&mut self, portfolio_id: Uuid) {
        let results: Vec<_> = self
            .trades
            .iter()
            .filter(|t| t.portfolio_id == portfolio_id)
            .map(|t| t.result)
            .collect();
        if let Some(portfolio) = self.portfolios.iter_mut().find(|p| p.id == portfolio_id) {
            portfolio.rebalance(&results);
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for InMemoryRepository {
    async fn create_portfolio(&self, user_id: Uuid, input: NewPortfolio) -> Result<Portfolio, DbError> {
        let portfolio = open_portfolio(user_id, &input, Utc::now())?;
        self.state.write().await.portfolios.push(portfolio.clone());
        tracing::info!(portfolio_id = %portfolio.id, %user_id, "Created portfolio");
        Ok(portfolio)
    }

    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<Portfolio>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .portfolios
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Portfolio, DbError> {
        self.state.read().await.portfolio(user_id, portfolio_id).cloned()
    }
}

#[async_trait]
impl TradeStore for InMemoryRepository {
    async fn list_trades(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Vec<Trade>, DbError> {
        let state = self.state.read().await;
        state.portfolio(user_id, portfolio_id)?;
        Ok(state
            .trades
            .iter()
            .rev()
            .filter(|t| t.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    async fn create_trade(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        input: NewTrade,
    ) -> Result<Trade, DbError> {
        let mut state = self.state.write().await;
        let portfolio = state.portfolio(user_id, portfolio_id)?;
        let trade = open_trade(&self.sizer, portfolio, &input, Utc::now())?;

        state.trades.push(trade.clone());
        state.rebalance(portfolio_id);
        tracing::info!(trade_id = %trade.id, %portfolio_id, lot_size = %trade.lot_size, "Created trade");
        Ok(trade)
    }

    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        update: TradeUpdate,
    ) -> Result<Trade, DbError> {
        let mut state = self.state.write().await;
        let index = state.trade_index(user_id, trade_id)?;

        // Amend a copy so a rejected update leaves the stored row untouched.
        let mut trade = state.trades[index].clone();
        amend_trade(&self.sizer, &mut trade, &update)?;

        state.trades[index] = trade.clone();
        state.rebalance(trade.portfolio_id);
        tracing::info!(%trade_id, "Updated trade");
        Ok(trade)
    }

    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        let index = state.trade_index(user_id, trade_id)?;
        let trade = state.trades.remove(index);
        state.rebalance(trade.portfolio_id);
        tracing::info!(%trade_id, "Deleted trade");
        Ok(())
    }
}
