use analytics::{AnalyticsEngine, AnalyticsReport};
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use configuration::{Config, load_config};
use core_types::{ChartPeriod, Trade, TradeRecord};
use database::{DbRepository, InMemoryRepository, Repository, connect, run_migrations};
use risk::{FixedFractionalSizer, lot_size};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use web_server::{AppState, run_server};

/// The main entry point for the trade journal application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = match &cli.command {
        Commands::Serve(args) => args.config.clone(),
        _ => None,
    };
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    let _log_guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &config).await,
        Commands::Lot(args) => handle_lot(args),
        Commands::Risk(args) => handle_risk(args),
        Commands::Analyze(args) => handle_analyze(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A trading journal: position sizing, trade logging and performance analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Compute the lot size for a risk amount and stop-loss distance.
    Lot(LotArgs),
    /// Compute the risk amount for a balance, and the lot size when a stop-loss is given.
    Risk(RiskArgs),
    /// Print the analytics dashboard for a JSON export of trades.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep data in memory instead of PostgreSQL. Everything is lost on exit.
    #[arg(long)]
    memory: bool,
}

#[derive(Parser)]
struct LotArgs {
    /// Amount of money at risk (e.g., 100).
    #[arg(long)]
    risk: Decimal,

    /// Stop-loss distance in points (e.g., 50).
    #[arg(long)]
    stop_loss: Decimal,
}

#[derive(Parser)]
struct RiskArgs {
    /// Current account balance.
    #[arg(long)]
    balance: Decimal,

    /// Percentage of the balance to risk (e.g., 0.5 for 0.5%).
    #[arg(long, default_value = "0.5")]
    risk_percentage: Decimal,

    /// Stop-loss distance in points. When given, the lot size is printed too.
    #[arg(long)]
    stop_loss: Option<Decimal>,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// JSON file holding an array of trade records.
    #[arg(long)]
    trades: PathBuf,

    /// The portfolio's starting balance, used for ROI.
    #[arg(long)]
    initial_balance: Decimal,

    /// Chart window: 7d, 1m, 3m or all. Defaults to the configured period.
    #[arg(long)]
    period: Option<ChartPeriod>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let repo: Arc<dyn Repository> = if args.memory {
        tracing::warn!("Running with the in-memory store; data will not survive a restart");
        Arc::new(InMemoryRepository::new())
    } else {
        let pool = connect().await.context("Failed to connect to the database")?;
        run_migrations(&pool).await.context("Failed to run database migrations")?;
        Arc::new(DbRepository::new(pool))
    };

    let state = AppState::new(repo, config.analytics.default_period);
    run_server(&config.server.address(), state).await
}

fn handle_lot(args: LotArgs) -> anyhow::Result<()> {
    let lot = lot_size(args.risk, args.stop_loss)?;
    println!("Lot size: {}", lot.round_dp(4));
    Ok(())
}

fn handle_risk(args: RiskArgs) -> anyhow::Result<()> {
    let risk = risk::risk_amount(args.balance, args.risk_percentage)?;
    println!("Risk amount: {}", risk.round_dp(2));

    if let Some(stop_loss) = args.stop_loss {
        let size = FixedFractionalSizer::new().size_for_balance(
            args.balance,
            args.risk_percentage,
            stop_loss,
        )?;
        println!("Lot size:    {}", size.lot_size.round_dp(4));
    }
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.trades)
        .with_context(|| format!("Failed to read {}", args.trades.display()))?;
    let records: Vec<TradeRecord> =
        serde_json::from_str(&raw).context("Trades file must be a JSON array of trade records")?;
    let trades: Vec<Trade> = records.into_iter().map(Trade::from).collect();

    let period = args.period.unwrap_or(config.analytics.default_period);
    let report = AnalyticsEngine::new().calculate(&trades, args.initial_balance, period, Utc::now());
    tracing::info!(trades = trades.len(), %period, "Analysed trade export");

    print_report(&report);
    Ok(())
}

// ==============================================================================
// Presentation
// ==============================================================================

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn print_report(report: &AnalyticsReport) {
    let summary = &report.summary;
    let metrics = &report.metrics;

    let mut overview = table(vec!["Metric", "Value"]);
    let rows = [
        ("Total P&L", summary.total_pnl.round_dp(2).to_string()),
        ("Trades", summary.total_trades.to_string()),
        ("Winners / Losers", format!("{} / {}", summary.winning_trades, summary.losing_trades)),
        ("Win rate", format!("{}%", summary.win_rate.round_dp(1))),
        ("Average win", summary.average_win.round_dp(2).to_string()),
        ("Average loss", summary.average_loss.round_dp(2).to_string()),
        ("Profit factor", metrics.profit_factor.round_dp(2).to_string()),
        ("ROI", format!("{}%", metrics.roi.round_dp(2))),
        ("Average risk", metrics.average_risk.round_dp(2).to_string()),
        ("Best / Worst", format!("{} / {}", metrics.best_trade.round_dp(2), metrics.worst_trade.round_dp(2))),
        ("Streaks (W / L)", format!("{} / {}", metrics.max_winning_streak, metrics.max_losing_streak)),
    ];
    for (name, value) in rows {
        overview.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("{overview}");

    if !report.indicators.is_empty() {
        let mut indicators = table(vec!["Indicator", "Value", "Level", "Progress"]);
        for reading in &report.indicators {
            indicators.add_row(vec![
                Cell::new(format!("{:?}", reading.indicator)),
                Cell::new(reading.value.round_dp(2)),
                Cell::new(reading.level),
                Cell::new(format!("{}%", reading.progress.round_dp(0))),
            ]);
        }
        println!("{indicators}");
    }

    if !report.instruments.is_empty() {
        let mut instruments = table(vec!["Instrument", "Trades", "Result", "Win rate"]);
        for group in &report.instruments {
            instruments.add_row(vec![
                Cell::new(&group.instrument),
                Cell::new(group.trades),
                Cell::new(group.total_result.round_dp(2)),
                Cell::new(format!("{}%", group.win_rate.round_dp(1))),
            ]);
        }
        println!("{instruments}");
    }

    if report.series.is_empty() {
        println!("No trades in the {} window.", report.period);
    } else {
        let mut series = table(vec!["Date", "Cumulative P&L"]);
        for point in &report.series {
            series.add_row(vec![Cell::new(&point.label), Cell::new(point.value.round_dp(2))]);
        }
        println!("{series}");
    }
}
