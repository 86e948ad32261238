//! # Dropshort: drawdown-triggered short on a correlated asset
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  get_price ×2   ┌──────────────────────────┐  place_order / close_position  ┌──────────────┐
//!  │ PriceSource  │ ───────────────▶│     StrategyEngine       │ ──────────────────────────────▶│  OrderSink   │
//!  │ binance /    │                 │  history → drawdown →    │                                │ dry-run /    │
//!  │ hyperliquid  │                 │  gate → tracker (SL/TP)  │                                │ gateway      │
//!  └──────────────┘                 └──────────────────────────┘                                └──────────────┘
//!                                        │ snapshots / events          │ closed trades
//!                                        ▼                             ▼
//!                                  MonitorState ──▶ /ws/monitor   CsvTradeLogger
//! ```
//!
//! ## Commands
//!
//! | Command   | What it does                                            |
//! |-----------|---------------------------------------------------------|
//! | `run`     | Poll live prices every `POLL_INTERVAL_SECS` until Ctrl-C |
//! | `once`    | One tick with prices given on the command line          |
//! | `replay`  | Step two price series through the engine, dry-run only  |
//!
//! See `config` for environment variables. `RUST_LOG` overrides the default
//! `dropshort=debug,tower_http=info` filter.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod clock;
mod config;
mod engine;
mod error;
mod events;
mod exchange;
mod feeds;
mod journal;
mod models;
mod routes;
mod runner;
mod state;

use cli::{Cli, Command};
use clock::{Clock, ManualClock, SystemClock};
use config::{RuntimeConfig, StrategyConfig};
use engine::StrategyEngine;
use exchange::{DryRunOrderSink, GatewayOrderSink, OrderSink};
use feeds::{BinancePriceSource, HyperliquidPriceSource, ManualPriceSource, PriceSource};
use journal::{CsvTradeLogger, TradeLogger};
use state::{build_state, SharedState};

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional, real env vars win) ───────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("dropshort=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    let cli = Cli::parse();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        DROPSHORT · Drawdown Short Engine      ║
  ║        reference drop  ·  correlated short    ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Resolve configuration (env, then CLI overrides) ───────────────────
    let mut strategy = StrategyConfig::from_env().context("Invalid environment configuration")?;
    let mut runtime = RuntimeConfig::from_env();
    cli.overrides.apply(&mut strategy, &mut runtime);
    strategy.validate().context("Invalid strategy configuration")?;

    info!(
        reference   = %strategy.reference_symbol,
        traded      = %strategy.traded_symbol,
        threshold   = strategy.drop_pct_threshold,
        lookback    = strategy.lookback_secs,
        window      = strategy.entry_window_secs,
        cooldown    = strategy.cooldown_secs,
        leverage    = strategy.leverage,
        sl_pct      = strategy.stop_loss_pct,
        tp_pct      = strategy.take_profit_pct,
        eager_expiry = strategy.eager_window_expiry,
        "Strategy configured"
    );

    let client = reqwest::Client::new();
    let journal = open_journal(&runtime)?;

    // ── 4. Dispatch ──────────────────────────────────────────────────────────
    match cli.command {
        Command::Run => {
            let prices = build_price_source(&runtime, &client)?;
            let orders = build_order_sink(&runtime, &client, SystemClock);
            let mut engine = attach(
                StrategyEngine::new(strategy, prices, orders, Arc::new(SystemClock)),
                journal,
            );

            let monitor = build_state();
            if let Some(addr) = &runtime.monitor_addr {
                serve_monitor(addr, monitor.clone()).await?;
            }

            runner::run_loop(&mut engine, Some(&*monitor))
                .await
                .context("Strategy loop stopped")?;
        }

        Command::Once { reference_price, traded_price } => {
            let prices = ManualPriceSource::new(SystemClock);
            prices.set_price(&strategy.reference_symbol, reference_price);
            prices.set_price(&strategy.traded_symbol, traded_price);

            let orders = build_order_sink(&runtime, &client, SystemClock);
            let mut engine = attach(
                StrategyEngine::new(strategy, Arc::new(prices), orders, Arc::new(SystemClock)),
                journal,
            );

            match runner::step(&mut engine, None).await.context("Tick failed")? {
                Some(outcome) => info!(outcome = %serde_json::to_string(&outcome)?, "Tick produced an order"),
                None => info!("Tick complete, no action"),
            }
            runner::log_summary(&engine.snapshot());
        }

        Command::Replay { reference_prices, traded_prices, step_secs } => {
            let series = Command::replay_series(&reference_prices, &traded_prices)?;
            if !(step_secs.is_finite() && step_secs > 0.0) {
                bail!("--step-secs must be > 0 (got {step_secs})");
            }

            let clock = ManualClock::new(0.0);
            let prices = ManualPriceSource::new(clock.clone());
            let mut engine = attach(
                StrategyEngine::new(
                    strategy,
                    Arc::new(prices.clone()),
                    Arc::new(DryRunOrderSink::new(clock.clone())),
                    Arc::new(clock.clone()),
                ),
                journal,
            );

            info!(ticks = series.len(), step_secs, "🎬 Replay starting");
            runner::replay(&mut engine, &prices, &clock, &series, step_secs)
                .await
                .context("Replay aborted")?;
        }
    }

    Ok(())
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

fn build_price_source(
    runtime: &RuntimeConfig,
    client: &reqwest::Client,
) -> anyhow::Result<Arc<dyn PriceSource>> {
    let source: Arc<dyn PriceSource> = match runtime.price_source.as_str() {
        "binance" => Arc::new(BinancePriceSource::new(
            client.clone(),
            &runtime.binance_base_url,
            SystemClock,
        )),
        "hyperliquid" => Arc::new(HyperliquidPriceSource::new(
            client.clone(),
            &runtime.hyperliquid_base_url,
            SystemClock,
        )),
        other => bail!("Unknown PRICE_SOURCE '{other}' (expected binance or hyperliquid)"),
    };
    info!(source = %runtime.price_source, "📡 Price source ready");
    Ok(source)
}

fn build_order_sink<C: Clock + 'static>(
    runtime: &RuntimeConfig,
    client: &reqwest::Client,
    clock: C,
) -> Arc<dyn OrderSink> {
    match &runtime.order_gateway_url {
        Some(url) => {
            info!(url = %url, "🔗 Orders go to the gateway");
            Arc::new(GatewayOrderSink::new(client.clone(), url, clock))
        }
        None => {
            info!("🎭 DRY-RUN mode, no orders leave this process");
            Arc::new(DryRunOrderSink::new(clock))
        }
    }
}

fn open_journal(runtime: &RuntimeConfig) -> anyhow::Result<Option<Arc<dyn TradeLogger>>> {
    let Some(path) = &runtime.trade_log_path else {
        return Ok(None);
    };
    let logger = CsvTradeLogger::new(path)
        .with_context(|| format!("Failed to open trade journal at {path}"))?;
    info!(path = %logger.path().display(), "📒 Trade journal ready");

    let logger: Arc<dyn TradeLogger> = Arc::new(logger);
    Ok(Some(logger))
}

fn attach(engine: StrategyEngine, journal: Option<Arc<dyn TradeLogger>>) -> StrategyEngine {
    match journal {
        Some(journal) => engine.with_journal(journal),
        None => engine,
    }
}

async fn serve_monitor(addr: &str, state: SharedState) -> anyhow::Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid MONITOR_ADDR '{addr}'"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind monitor on {addr}"))?;

    info!(?addr, "🚀 Monitor listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Monitor server stopped");
        }
    });
    Ok(())
}
