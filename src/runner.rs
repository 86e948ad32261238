//! # runner
//!
//! Drives a [`StrategyEngine`] and publishes what it does.
//!
//! ```text
//! loop:
//!   select { interval.tick() | ctrl_c }   ← shutdown only between ticks
//!   engine.on_tick()
//!     Ok(outcome)   → monitor events + snapshot
//!     Err(io/data)  → TICK_FAILED, keep going
//!     Err(invariant)→ stop
//! ```

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::clock::ManualClock;
use crate::engine::{EngineSnapshot, OrderOutcome, StrategyEngine};
use crate::error::EngineError;
use crate::events::MonitorEvent;
use crate::feeds::ManualPriceSource;
use crate::state::MonitorState;

// ─── Single Step ──────────────────────────────────────────────────────────────

/// One tick plus its side effects on the monitor.
pub async fn step(
    engine: &mut StrategyEngine,
    monitor: Option<&MonitorState>,
) -> Result<Option<OrderOutcome>, EngineError> {
    let result = engine.on_tick().await;

    match &result {
        Ok(outcome) => {
            if let Some(monitor) = monitor {
                if let Some(outcome) = outcome {
                    monitor.broadcast(&MonitorEvent::from_outcome(outcome));
                    if let OrderOutcome::Exited { trade, .. } = outcome {
                        monitor.push_trade(trade.clone()).await;
                    }
                }
                monitor.publish_snapshot(engine.snapshot()).await;
            }
        }
        Err(e) => {
            if e.is_invariant_violation() {
                error!(error = %e, "❌ Tick aborted on invariant violation");
            } else if matches!(e, EngineError::InvalidPrice { .. }) {
                warn!(error = %e, "Tick skipped");
            } else {
                error!(error = %e, "❌ Tick failed, will retry next interval");
            }
            if let Some(monitor) = monitor {
                monitor.record_failure(&e.to_string());
            }
        }
    }

    result
}

// ─── Poll Loop ────────────────────────────────────────────────────────────────

/// Poll until Ctrl-C or an invariant violation. Returns the final snapshot.
pub async fn run_loop(
    engine: &mut StrategyEngine,
    monitor: Option<&MonitorState>,
) -> Result<EngineSnapshot, EngineError> {
    let poll_interval = engine.config().poll_interval();
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval = ?poll_interval, "🔁 Poll loop started");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("🛑 Ctrl-C received, stopping after last completed tick");
                break;
            }
        }

        if let Err(e) = step(engine, monitor).await {
            if e.is_invariant_violation() {
                return Err(e);
            }
        }
    }

    let snapshot = engine.snapshot();
    log_summary(&snapshot);
    Ok(snapshot)
}

// ─── Replay ───────────────────────────────────────────────────────────────────

/// Feed paired price series through the engine on a manual clock, one tick
/// per `step_secs`, starting at t = 0.
pub async fn replay(
    engine: &mut StrategyEngine,
    prices: &ManualPriceSource<ManualClock>,
    clock: &ManualClock,
    series: &[(f64, f64)],
    step_secs: f64,
) -> Result<EngineSnapshot, EngineError> {
    let (reference, traded) = {
        let config = engine.config();
        (config.reference_symbol.clone(), config.traded_symbol.clone())
    };

    for (i, &(reference_price, traded_price)) in series.iter().enumerate() {
        clock.set(i as f64 * step_secs);
        prices.set_price(&reference, reference_price);
        prices.set_price(&traded, traded_price);

        match step(engine, None).await {
            Ok(Some(outcome)) => log_outcome(i, &outcome),
            Ok(None) => {}
            Err(e) if e.is_invariant_violation() => return Err(e),
            Err(_) => {}
        }
    }

    let snapshot = engine.snapshot();
    log_summary(&snapshot);
    Ok(snapshot)
}

fn log_outcome(tick: usize, outcome: &OrderOutcome) {
    match outcome {
        OrderOutcome::Entered { position, .. } => {
            info!(tick, price = position.entry_price, qty = position.quantity, "▶ ENTER {}", position.side);
        }
        OrderOutcome::Exited { trade, .. } => {
            info!(tick, price = trade.exit_price, pnl = trade.pnl, "◀ EXIT {}", trade.reason);
        }
        OrderOutcome::EntryRejected { ack } | OrderOutcome::ExitRejected { ack, .. } => {
            info!(tick, message = %ack.message, "✖ REJECTED");
        }
    }
}

pub fn log_summary(snapshot: &EngineSnapshot) {
    let stats = &snapshot.stats;
    info!(
        ticks           = stats.ticks,
        entries         = stats.entries,
        exits           = stats.exits,
        rejected_orders = stats.rejected_orders,
        realised_pnl    = stats.realised_pnl,
        open_position   = snapshot.position.is_some(),
        unrealised_pnl  = ?snapshot.unrealised_pnl,
        "📊 Session summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use crate::config::StrategyConfig;
    use crate::exchange::DryRunOrderSink;
    use crate::state::build_state;

    fn engine_with(clock: &ManualClock, prices: &ManualPriceSource<ManualClock>) -> StrategyEngine {
        StrategyEngine::new(
            StrategyConfig::default(),
            Arc::new(prices.clone()),
            Arc::new(DryRunOrderSink::new(clock.clone())),
            Arc::new(clock.clone()),
        )
    }

    #[tokio::test]
    async fn test_replay_enters_and_takes_profit() {
        let clock = ManualClock::new(0.0);
        let prices = ManualPriceSource::new(clock.clone());
        let mut engine = engine_with(&clock, &prices);

        let series = [(100.0, 3000.0), (99.5, 3000.0), (98.9, 3000.0), (98.9, 2900.0)];
        let snapshot = replay(&mut engine, &prices, &clock, &series, 60.0).await.unwrap();

        assert_eq!(snapshot.stats.ticks, 4);
        assert_eq!(snapshot.stats.entries, 1);
        assert_eq!(snapshot.stats.exits, 1);
        assert!((snapshot.stats.realised_pnl - 100.0).abs() < 1e-9);
        assert!(snapshot.position.is_none());
    }

    #[tokio::test]
    async fn test_replay_skips_bad_ticks() {
        let clock = ManualClock::new(0.0);
        let prices = ManualPriceSource::new(clock.clone());
        let mut engine = engine_with(&clock, &prices);

        let series = [(100.0, 3000.0), (0.0, 3000.0), (99.0, 3000.0)];
        let snapshot = replay(&mut engine, &prices, &clock, &series, 60.0).await.unwrap();

        assert_eq!(snapshot.stats.ticks, 2);
        assert_eq!(engine.history().len("BTCUSDT"), 2);
        assert_eq!(snapshot.stats.entries, 1);
    }

    #[tokio::test]
    async fn test_step_publishes_to_monitor() {
        let clock = ManualClock::new(0.0);
        let prices = ManualPriceSource::new(clock.clone());
        let mut engine = engine_with(&clock, &prices);
        let monitor = build_state();
        let mut rx = monitor.broadcast_tx.subscribe();

        prices.set_price("BTCUSDT", 100.0);
        prices.set_price("ETHUSDT", 3000.0);
        step(&mut engine, Some(&*monitor)).await.unwrap();

        clock.set(30.0);
        prices.set_price("BTCUSDT", 98.0);
        step(&mut engine, Some(&*monitor)).await.unwrap();

        clock.set(60.0);
        prices.set_price("ETHUSDT", 2900.0);
        step(&mut engine, Some(&*monitor)).await.unwrap();

        let mut events = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&msg).unwrap();
            events.push(value["event"].as_str().unwrap_or_default().to_string());
        }
        assert_eq!(
            events,
            ["SNAPSHOT", "POSITION_OPENED", "SNAPSHOT", "POSITION_CLOSED", "SNAPSHOT"]
        );
        assert_eq!(monitor.trade_history.read().await.len(), 1);
        assert_eq!(monitor.tick_count.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_step_reports_failure() {
        let clock = ManualClock::new(0.0);
        let prices = ManualPriceSource::new(clock.clone());
        let mut engine = engine_with(&clock, &prices);
        let monitor = build_state();

        // no prices set → UnknownSymbol from the feed
        let err = step(&mut engine, Some(&*monitor)).await.unwrap_err();
        assert!(matches!(err, EngineError::PriceSource(_)));
        assert_eq!(monitor.failed_ticks.load(Ordering::Relaxed), 1);
        assert!(monitor.snapshot.read().await.is_none());
    }
}
