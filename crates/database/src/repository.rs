use crate::DbError;
use crate::lifecycle::{amend_trade, open_portfolio, open_trade};
use crate::store::{PortfolioStore, TradeStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use core_types::{NewPortfolio, NewTrade, Portfolio, Trade, TradeDirection, TradeUpdate};
use risk::FixedFractionalSizer;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::FromRow;
use uuid::Uuid;

const PORTFOLIO_COLUMNS: &str =
    "id, user_id, name, balance, initial_balance, risk_percentage, created_at";
const TRADE_COLUMNS: &str = "t.id, t.portfolio_id, t.trade_date, t.instrument, t.timeframe, \
    t.direction, t.risk_amount, t.stop_loss_points, t.lot_size, t.result, t.notes, t.created_at";

/// The PostgreSQL-backed store. Each trade write runs in one transaction
/// together with the balance recomputation it triggers.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    sizer: FixedFractionalSizer,
}

/// A row from the `portfolios` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbPortfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub risk_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<DbPortfolio> for Portfolio {
    fn from(row: DbPortfolio) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            balance: row.balance,
            initial_balance: row.initial_balance,
            risk_percentage: row.risk_percentage,
            created_at: row.created_at,
        }
    }
}

/// A row from the `trades` table. `direction` is stored as `buy` / `sell` text.
#[derive(Debug, Clone, FromRow)]
pub struct DbTrade {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub trade_date: Option<NaiveDate>,
    pub instrument: Option<String>,
    pub timeframe: Option<String>,
    pub direction: Option<String>,
    pub risk_amount: Decimal,
    pub stop_loss_points: Decimal,
    pub lot_size: Decimal,
    pub result: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbTrade> for Trade {
    type Error = DbError;

    fn try_from(row: DbTrade) -> Result<Self, Self::Error> {
        let direction = row
            .direction
            .as_deref()
            .map(str::parse::<TradeDirection>)
            .transpose()
            .map_err(|e| DbError::Corrupt(format!("trade {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            portfolio_id: row.portfolio_id,
            created_at: row.created_at,
            trade_date: row.trade_date,
            instrument: row.instrument,
            timeframe: row.timeframe,
            direction,
            risk_amount: row.risk_amount,
            stop_loss_points: row.stop_loss_points,
            lot_size: row.lot_size,
            result: row.result,
            notes: row.notes,
        })
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sizer: FixedFractionalSizer::new(),
        }
    }

    /// Recomputes `balance = initial_balance + sum(result)` for one portfolio.
    async fn rebalance(conn: &mut PgConnection, portfolio_id: Uuid) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE portfolios
            SET balance = initial_balance
                + COALESCE((SELECT SUM(result) FROM trades WHERE portfolio_id = $1), 0)
            WHERE id = $1
            "#,
        )
        .bind(portfolio_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Loads a trade whose portfolio belongs to `user_id`, locking the row.
    async fn owned_trade(conn: &mut PgConnection, user_id: Uuid, trade_id: Uuid) -> Result<Trade, DbError> {
        let query = format!(
            "SELECT {TRADE_COLUMNS} FROM trades t \
             JOIN portfolios p ON p.id = t.portfolio_id \
             WHERE t.id = $1 AND p.user_id = $2 \
             FOR UPDATE OF t"
        );
        let row = sqlx::query_as::<_, DbTrade>(&query)
            .bind(trade_id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(DbError::NotFound)?;
        Trade::try_from(row)
    }
}

#[async_trait]
impl PortfolioStore for DbRepository {
    async fn create_portfolio(&self, user_id: Uuid, input: NewPortfolio) -> Result<Portfolio, DbError> {
        // TIMESTAMPTZ keeps microseconds.
        let portfolio = open_portfolio(user_id, &input, Utc::now().trunc_subsecs(6))?;

        sqlx::query(
            r#"
            INSERT INTO portfolios (id, user_id, name, balance, initial_balance, risk_percentage, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(portfolio.id)
        .bind(portfolio.user_id)
        .bind(&portfolio.name)
        .bind(portfolio.balance)
        .bind(portfolio.initial_balance)
        .bind(portfolio.risk_percentage)
        .bind(portfolio.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(portfolio_id = %portfolio.id, %user_id, "Created portfolio");
        Ok(portfolio)
    }

    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<Portfolio>, DbError> {
        let query = format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, DbPortfolio>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    async fn get_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Portfolio, DbError> {
        let query = format!("SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, DbPortfolio>(&query)
            .bind(portfolio_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Portfolio::from)
            .ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl TradeStore for DbRepository {
    async fn list_trades(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<Vec<Trade>, DbError> {
        // Distinguishes "not yours" from "no trades yet".
        self.get_portfolio(user_id, portfolio_id).await?;

        let query = format!(
            "SELECT {TRADE_COLUMNS} FROM trades t WHERE t.portfolio_id = $1 ORDER BY t.created_at DESC"
        );
        let rows = sqlx::query_as::<_, DbTrade>(&query)
            .bind(portfolio_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn create_trade(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        input: NewTrade,
    ) -> Result<Trade, DbError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        let portfolio: Portfolio = sqlx::query_as::<_, DbPortfolio>(&query)
            .bind(portfolio_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?
            .into();

        let trade = open_trade(&self.sizer, &portfolio, &input, Utc::now().trunc_subsecs(6))?;

        sqlx::query(
            r#"
            INSERT INTO trades (id, portfolio_id, trade_date, instrument, timeframe, direction,
                                risk_amount, stop_loss_points, lot_size, result, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(trade.id)
        .bind(trade.portfolio_id)
        .bind(trade.trade_date)
        .bind(&trade.instrument)
        .bind(&trade.timeframe)
        .bind(trade.direction.map(|d| d.as_str()))
        .bind(trade.risk_amount)
        .bind(trade.stop_loss_points)
        .bind(trade.lot_size)
        .bind(trade.result)
        .bind(&trade.notes)
        .bind(trade.created_at)
        .execute(&mut *tx)
        .await?;

        Self::rebalance(&mut *tx, portfolio_id).await?;
        tx.commit().await?;

        tracing::info!(trade_id = %trade.id, %portfolio_id, lot_size = %trade.lot_size, "Created trade");
        Ok(trade)
    }

    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        update: TradeUpdate,
    ) -> Result<Trade, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut trade = Self::owned_trade(&mut *tx, user_id, trade_id).await?;
        amend_trade(&self.sizer, &mut trade, &update)?;

        sqlx::query(
            r#"
            UPDATE trades
            SET trade_date = $2, instrument = $3, timeframe = $4, direction = $5,
                risk_amount = $6, stop_loss_points = $7, lot_size = $8, result = $9, notes = $10
            WHERE id = $1
            "#,
        )
        .bind(trade.id)
        .bind(trade.trade_date)
        .bind(&trade.instrument)
        .bind(&trade.timeframe)
        .bind(trade.direction.map(|d| d.as_str()))
        .bind(trade.risk_amount)
        .bind(trade.stop_loss_points)
        .bind(trade.lot_size)
        .bind(trade.result)
        .bind(&trade.notes)
        .execute(&mut *tx)
        .await?;

        Self::rebalance(&mut *tx, trade.portfolio_id).await?;
        tx.commit().await?;

        tracing::info!(%trade_id, "Updated trade");
        Ok(trade)
    }

    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let portfolio_id: Uuid = sqlx::query_scalar(
            r#"
            DELETE FROM trades t
            USING portfolios p
            WHERE t.id = $1 AND t.portfolio_id = p.id AND p.user_id = $2
            RETURNING t.portfolio_id
            "#,
        )
        .bind(trade_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        Self::rebalance(&mut *tx, portfolio_id).await?;
        tx.commit().await?;

        tracing::info!(%trade_id, %portfolio_id, "Deleted trade");
        Ok(())
    }
}
