use analytics::AnalyticsEngine;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use core_types::ChartPeriod;
use database::Repository;
use risk::FixedFractionalSizer;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::AppError;
pub use extract::{USER_ID_HEADER, UserId};

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub engine: AnalyticsEngine,
    pub sizer: FixedFractionalSizer,
    /// Chart window used when a request omits `?period=`.
    pub default_period: ChartPeriod,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, default_period: ChartPeriod) -> Self {
        Self {
            repo,
            engine: AnalyticsEngine::new(),
            sizer: FixedFractionalSizer::new(),
            default_period,
        }
    }
}

/// Builds the API router with CORS, request tracing and a 1 MB body limit.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/calculate-lot", post(handlers::calculate_lot))
        .route("/api/calculate-risk", post(handlers::calculate_risk))
        .route("/api/full-calculation", post(handlers::full_calculation))
        .route(
            "/api/portfolios",
            get(handlers::list_portfolios).post(handlers::create_portfolio),
        )
        .route("/api/portfolios/:portfolio_id", get(handlers::get_portfolio))
        .route(
            "/api/portfolios/:portfolio_id/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route(
            "/api/portfolios/:portfolio_id/analytics",
            get(handlers::get_analytics),
        )
        .route(
            "/api/trades/:trade_id",
            put(handlers::update_trade).delete(handlers::delete_trade),
        )
        .with_state(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Binds `addr` and serves the API until the process is stopped.
///
/// Tracing must already be initialised by the caller.
pub async fn run_server(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{FullCalculationResponse, LotResponse, PortfolioView, RiskResponse, TradeView};
    use analytics::AnalyticsReport;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use database::InMemoryRepository;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
        router(AppState::new(repo, ChartPeriod::All))
    }

    fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = send(&app(), request(Method::GET, "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<Value>(&body), json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn calculate_lot_uses_formula() {
        let app = app();
        let body = json!({ "risk": 100, "stop_loss": 50 });
        let (status, bytes) = send(&app, request(Method::POST, "/api/calculate-lot", None, Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<LotResponse>(&bytes).lot_size, dec!(0.2));

        let body = json!({ "risk": 100, "stop_loss": 0 });
        let (status, bytes) = send(&app, request(Method::POST, "/api/calculate-lot", None, Some(body))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(parse::<Value>(&bytes)["error"].is_string());
    }

    #[tokio::test]
    async fn calculators_round_their_outputs() {
        let app = app();
        let body = json!({ "balance": 12345.67, "risk_percentage": 0.5 });
        let (status, bytes) = send(&app, request(Method::POST, "/api/calculate-risk", None, Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<RiskResponse>(&bytes).risk_amount, dec!(61.73));

        let body = json!({ "balance": 10000 });
        let (status, bytes) = send(&app, request(Method::POST, "/api/full-calculation", None, Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        let full: FullCalculationResponse = parse(&bytes);
        assert_eq!(full.input.stop_loss, dec!(15));
        assert_eq!(full.calculation.risk_amount, dec!(50));
        assert_eq!(full.calculation.lot_size, dec!(0.3333));
    }

    #[tokio::test]
    async fn portfolios_need_a_user() {
        let app = app();
        let (status, _) = send(&app, request(Method::GET, "/api/portfolios", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/api/portfolios")
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn portfolio_crud_is_owner_scoped() {
        let app = app();
        let owner = Uuid::new_v4();
        let body = json!({ "name": "Main", "initial_balance": 10000, "risk_percentage": 1 });
        let (status, bytes) = send(&app, request(Method::POST, "/api/portfolios", Some(owner), Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        let created: PortfolioView = parse(&bytes);
        assert_eq!(created.current_risk_amount, dec!(100));

        let uri = format!("/api/portfolios/{}", created.portfolio.id);
        let (status, bytes) = send(&app, request(Method::GET, &uri, Some(owner), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<PortfolioView>(&bytes), created);

        let (status, _) = send(&app, request(Method::GET, &uri, Some(Uuid::new_v4()), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let bad = json!({ "name": "", "initial_balance": 10000 });
        let (status, _) = send(&app, request(Method::POST, "/api/portfolios", Some(owner), Some(bad))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn trade_lifecycle_drives_balance_and_analytics() {
        let app = app();
        let user = Uuid::new_v4();
        let body = json!({ "name": "Main", "initial_balance": 20000 });
        let (_, bytes) = send(&app, request(Method::POST, "/api/portfolios", Some(user), Some(body))).await;
        let portfolio: PortfolioView = parse(&bytes);
        let trades_uri = format!("/api/portfolios/{}/trades", portfolio.portfolio.id);

        let body = json!({ "instrument": "XAUUSD", "direction": "buy", "stop_loss_points": 50, "result": 150 });
        let (status, bytes) = send(&app, request(Method::POST, &trades_uri, Some(user), Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        let trade: TradeView = parse(&bytes);
        assert_eq!(trade.trade.lot_size, dec!(0.2));
        assert_eq!(trade.risk_reward_ratio, Some(dec!(1.5)));
        assert!(trade.is_profitable);

        let trade_uri = format!("/api/trades/{}", trade.trade.id);
        let update = json!({ "stop_loss_points": 0 });
        let (status, _) = send(&app, request(Method::PUT, &trade_uri, Some(user), Some(update))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let update = json!({ "result": -50 });
        let (status, bytes) = send(&app, request(Method::PUT, &trade_uri, Some(user), Some(update))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!parse::<TradeView>(&bytes).is_profitable);

        let uri = format!("/api/portfolios/{}", portfolio.portfolio.id);
        let (_, bytes) = send(&app, request(Method::GET, &uri, Some(user), None)).await;
        assert_eq!(parse::<PortfolioView>(&bytes).portfolio.balance, dec!(19950));

        let analytics_uri = format!("/api/portfolios/{}/analytics", portfolio.portfolio.id);
        let (status, bytes) = send(&app, request(Method::GET, &analytics_uri, Some(user), None)).await;
        assert_eq!(status, StatusCode::OK);
        let report: AnalyticsReport = parse(&bytes);
        assert_eq!(report.period, ChartPeriod::All);
        assert_eq!(report.summary.total_trades, 1);
        assert_eq!(report.summary.total_pnl, dec!(-50));
        assert_eq!(report.metrics.roi, dec!(-0.25));
        assert_eq!(report.series.len(), 2);

        let bad_period = format!("{analytics_uri}?period=2w");
        let (status, _) = send(&app, request(Method::GET, &bad_period, Some(user), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, request(Method::DELETE, &trade_uri, Some(user), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, request(Method::DELETE, &trade_uri, Some(user), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, bytes) = send(&app, request(Method::GET, &trades_uri, Some(user), None)).await;
        assert!(parse::<Vec<TradeView>>(&bytes).is_empty());
    }
}
