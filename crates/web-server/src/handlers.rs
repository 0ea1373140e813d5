use crate::{AppState, error::AppError, extract::UserId};
use analytics::AnalyticsReport;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use core_types::{
    ChartPeriod, LOT_DP, MONEY_DP, NewPortfolio, NewTrade, Portfolio, Trade, TradeUpdate, to_scale,
};
use risk::lot_size;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

// ==============================================================================
// Calculator
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotRequest {
    pub risk: Decimal,
    pub stop_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotResponse {
    pub risk: Decimal,
    pub stop_loss: Decimal,
    pub lot_size: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    pub balance: Decimal,
    #[serde(default = "default_risk_percentage")]
    pub risk_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResponse {
    pub balance: Decimal,
    pub risk_percentage: Decimal,
    pub risk_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullCalculationRequest {
    pub balance: Decimal,
    #[serde(default = "default_risk_percentage")]
    pub risk_percentage: Decimal,
    #[serde(default = "default_stop_loss")]
    pub stop_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub risk_amount: Decimal,
    pub lot_size: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullCalculationResponse {
    pub input: FullCalculationRequest,
    pub calculation: Calculation,
}

fn default_risk_percentage() -> Decimal {
    dec!(0.5)
}

fn default_stop_loss() -> Decimal {
    dec!(15)
}

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// # POST /api/calculate-lot
pub async fn calculate_lot(Json(req): Json<LotRequest>) -> Result<Json<LotResponse>, AppError> {
    let lot = lot_size(req.risk, req.stop_loss)?;
    Ok(Json(LotResponse {
        risk: req.risk,
        stop_loss: req.stop_loss,
        lot_size: to_scale(lot, LOT_DP),
    }))
}

/// # POST /api/calculate-risk
pub async fn calculate_risk(Json(req): Json<RiskRequest>) -> Result<Json<RiskResponse>, AppError> {
    let risk_amount = risk::risk_amount(req.balance, req.risk_percentage)?;
    Ok(Json(RiskResponse {
        balance: req.balance,
        risk_percentage: req.risk_percentage,
        risk_amount: to_scale(risk_amount, MONEY_DP),
    }))
}

/// # POST /api/full-calculation
/// Balance to risk amount to lot size in one call.
pub async fn full_calculation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FullCalculationRequest>,
) -> Result<Json<FullCalculationResponse>, AppError> {
    let size = state
        .sizer
        .size_for_balance(req.balance, req.risk_percentage, req.stop_loss)?;
    Ok(Json(FullCalculationResponse {
        input: req,
        calculation: Calculation {
            risk_amount: to_scale(size.risk_amount, MONEY_DP),
            lot_size: to_scale(size.lot_size, LOT_DP),
        },
    }))
}

// ==============================================================================
// Portfolios
// ==============================================================================

/// A portfolio together with the values derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub current_risk_amount: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_pct: Decimal,
}

impl From<Portfolio> for PortfolioView {
    fn from(portfolio: Portfolio) -> Self {
        // A blown account has nothing left to risk.
        let current_risk_amount =
            risk::risk_amount(portfolio.balance, portfolio.risk_percentage).unwrap_or(Decimal::ZERO);
        Self {
            current_risk_amount: to_scale(current_risk_amount, MONEY_DP),
            total_pnl: portfolio.total_pnl(),
            total_pnl_pct: to_scale(portfolio.total_pnl_pct(), MONEY_DP),
            portfolio,
        }
    }
}

/// # GET /api/portfolios
pub async fn list_portfolios(
    user: UserId,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PortfolioView>>, AppError> {
    let portfolios = state.repo.list_portfolios(user.0).await?;
    Ok(Json(portfolios.into_iter().map(PortfolioView::from).collect()))
}

/// # POST /api/portfolios
pub async fn create_portfolio(
    user: UserId,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewPortfolio>,
) -> Result<(StatusCode, Json<PortfolioView>), AppError> {
    let portfolio = state.repo.create_portfolio(user.0, input).await?;
    Ok((StatusCode::CREATED, Json(portfolio.into())))
}

/// # GET /api/portfolios/:portfolio_id
pub async fn get_portfolio(
    user: UserId,
    Path(portfolio_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioView>, AppError> {
    let portfolio = state.repo.get_portfolio(user.0, portfolio_id).await?;
    Ok(Json(portfolio.into()))
}

// ==============================================================================
// Trades
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: Trade,
    pub is_profitable: bool,
    pub risk_reward_ratio: Option<Decimal>,
}

impl From<Trade> for TradeView {
    fn from(trade: Trade) -> Self {
        Self {
            is_profitable: trade.is_profitable(),
            risk_reward_ratio: trade.risk_reward_ratio().map(|r| to_scale(r, MONEY_DP)),
            trade,
        }
    }
}

/// # GET /api/portfolios/:portfolio_id/trades
pub async fn list_trades(
    user: UserId,
    Path(portfolio_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TradeView>>, AppError> {
    let trades = state.repo.list_trades(user.0, portfolio_id).await?;
    Ok(Json(trades.into_iter().map(TradeView::from).collect()))
}

/// # POST /api/portfolios/:portfolio_id/trades
pub async fn create_trade(
    user: UserId,
    Path(portfolio_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewTrade>,
) -> Result<(StatusCode, Json<TradeView>), AppError> {
    let trade = state.repo.create_trade(user.0, portfolio_id, input).await?;
    Ok((StatusCode::CREATED, Json(trade.into())))
}

/// # PUT /api/trades/:trade_id
pub async fn update_trade(
    user: UserId,
    Path(trade_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<TradeUpdate>,
) -> Result<Json<TradeView>, AppError> {
    let trade = state.repo.update_trade(user.0, trade_id, update).await?;
    Ok(Json(trade.into()))
}

/// # DELETE /api/trades/:trade_id
pub async fn delete_trade(
    user: UserId,
    Path(trade_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_trade(user.0, trade_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// Analytics
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// # GET /api/portfolios/:portfolio_id/analytics?period=7d
/// Recomputes the full report from the portfolio's current trades.
pub async fn get_analytics(
    user: UserId,
    Path(portfolio_id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<ChartPeriod>()?,
        None => state.default_period,
    };

    let portfolio = state.repo.get_portfolio(user.0, portfolio_id).await?;
    let trades = state.repo.list_trades(user.0, portfolio_id).await?;
    let report = state
        .engine
        .calculate(&trades, portfolio.initial_balance, period, Utc::now());

    tracing::info!(%portfolio_id, %period, trades = trades.len(), "Served analytics");
    Ok(Json(report))
}
