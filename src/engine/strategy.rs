//! # engine::strategy
//!
//! **Strategy Engine**: one state transition per tick.
//!
//! ## Order of operations (every tick)
//! ```text
//! 1. Fetch reference + traded prices, reject non-positive      → InvalidPrice
//! 2. Record both into PriceHistory
//!    (optional) expire a stale trigger window
//! 3. Position open?  → SL/TP check → close order → journal     → Exited / ExitRejected
//!                      (no entry evaluation on this tick)
//! 4. Flat?           → drawdown → EntryGate → short order       → Entered / EntryRejected
//! 5. Nothing to do                                              → None
//! ```
//!
//! The engine owns all mutable strategy state. `on_tick` takes `&mut self`,
//! so two ticks can never interleave.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::StrategyConfig;
use crate::engine::drawdown::DrawdownDetector;
use crate::engine::gate::{EntryGate, EntryGateState};
use crate::engine::history::PriceHistory;
use crate::engine::tracker::PositionTracker;
use crate::error::{EngineError, PositionError};
use crate::exchange::OrderSink;
use crate::feeds::PriceSource;
use crate::journal::TradeLogger;
use crate::models::{ClosedTrade, ExitReason, OrderAck, OrderRequest, Position, PriceTick, Side, Timestamp};

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// What a tick did, when it did anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderOutcome {
    Entered { position: Position, ack: OrderAck },
    /// Gate allowed entry but the venue said no. The trigger window stays
    /// open and no cooldown starts.
    EntryRejected { ack: OrderAck },
    Exited { trade: ClosedTrade, ack: OrderAck },
    /// SL/TP fired but the close order was refused. Position stays open.
    ExitRejected { reason: ExitReason, ack: OrderAck },
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Ticks whose prices were fetched and accepted.
    pub ticks: u64,
    pub entries: u64,
    pub exits: u64,
    pub rejected_orders: u64,
    pub realised_pnl: f64,
}

/// Read-only view for dashboards and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub taken_at: Timestamp,
    pub reference_symbol: String,
    pub traded_symbol: String,
    pub reference_price: Option<f64>,
    pub traded_price: Option<f64>,
    pub drawdown_pct: Option<f64>,
    pub threshold_pct: f64,
    pub gate: EntryGateState,
    pub window_active: bool,
    pub cooldown_remaining_secs: Option<f64>,
    pub position: Option<Position>,
    pub unrealised_pnl: Option<f64>,
    pub stats: EngineStats,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

pub struct StrategyEngine {
    config: StrategyConfig,
    prices: Arc<dyn PriceSource>,
    orders: Arc<dyn OrderSink>,
    journal: Option<Arc<dyn TradeLogger>>,
    clock: Arc<dyn Clock>,

    history: PriceHistory,
    detector: DrawdownDetector,
    gate: EntryGate,
    tracker: PositionTracker,

    last_drawdown: Option<f64>,
    stats: EngineStats,
}

impl StrategyEngine {
    pub fn new(
        config: StrategyConfig,
        prices: Arc<dyn PriceSource>,
        orders: Arc<dyn OrderSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = PriceHistory::new(config.history_retention_secs());
        let gate = EntryGate::new(config.entry_window_secs, config.cooldown_secs);

        info!(
            reference      = %config.reference_symbol,
            traded         = %config.traded_symbol,
            retention_secs = history.retention_secs(),
            "⚙️ Strategy engine ready"
        );

        Self {
            config,
            prices,
            orders,
            journal: None,
            clock,
            history,
            detector: DrawdownDetector,
            gate,
            tracker: PositionTracker::new(),
            last_drawdown: None,
            stats: EngineStats::default(),
        }
    }

    pub fn with_journal(mut self, journal: Arc<dyn TradeLogger>) -> Self {
        self.journal = Some(journal);
        self
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn gate(&self) -> EntryGateState {
        self.gate.state()
    }

    pub fn position(&self) -> Option<&Position> {
        self.tracker.position()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let now = self.clock.now();
        let traded_price = self.history.current(&self.config.traded_symbol);
        let position = self.tracker.position().cloned();
        let unrealised_pnl = position
            .as_ref()
            .zip(traded_price)
            .map(|(p, px)| p.unrealised_pnl(px));

        EngineSnapshot {
            taken_at: now,
            reference_symbol: self.config.reference_symbol.clone(),
            traded_symbol: self.config.traded_symbol.clone(),
            reference_price: self.history.current(&self.config.reference_symbol),
            traded_price,
            drawdown_pct: self.last_drawdown,
            threshold_pct: self.config.drop_pct_threshold,
            gate: self.gate.state(),
            window_active: self.gate.window_active(now),
            cooldown_remaining_secs: self.gate.cooldown_remaining(now),
            position,
            unrealised_pnl,
            stats: self.stats.clone(),
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    /// Run one tick. `Ok(None)` means nothing happened.
    pub async fn on_tick(&mut self) -> Result<Option<OrderOutcome>, EngineError> {
        let now = self.clock.now();

        // ── 1. Fetch + validate (no mutation before both pass) ───────────────
        let reference = self.prices.get_price(&self.config.reference_symbol).await?;
        let traded = self.prices.get_price(&self.config.traded_symbol).await?;
        validate(&reference)?;
        validate(&traded)?;

        // ── 2. Record ─────────────────────────────────────────────────────────
        self.stats.ticks += 1;
        self.history
            .record(&self.config.reference_symbol, reference.price, reference.timestamp);
        self.history
            .record(&self.config.traded_symbol, traded.price, traded.timestamp);

        if self.config.eager_window_expiry && self.gate.expire_stale_trigger(now) {
            debug!(now, "Trigger window expired");
        }

        // ── 3. Exit path ──────────────────────────────────────────────────────
        if self.tracker.is_open() {
            return self.manage_exit(traded.price, now).await;
        }

        // ── 4. Entry path ─────────────────────────────────────────────────────
        self.try_enter(traded.price, now).await
    }

    async fn manage_exit(
        &mut self,
        price: f64,
        now: Timestamp,
    ) -> Result<Option<OrderOutcome>, EngineError> {
        let Some(signal) = self.tracker.check_exit(
            price,
            self.config.stop_loss_pct,
            self.config.take_profit_pct,
        ) else {
            return Ok(None);
        };

        let (symbol, quantity, side, entry_price) = match self.tracker.position() {
            Some(p) => (p.symbol.clone(), p.quantity, p.side, p.entry_price),
            None => return Err(invariant(PositionError::NoOpenPosition)),
        };

        info!(
            symbol = %symbol,
            reason = %signal.reason,
            entry_price,
            exit_price = signal.exit_price,
            "🎯 Exit condition hit, closing position"
        );

        let ack = self.orders.close_position(&symbol, quantity, side).await?;
        if !ack.success {
            self.stats.rejected_orders += 1;
            warn!(message = %ack.message, reason = %signal.reason, "Close order rejected, position stays open");
            return Ok(Some(OrderOutcome::ExitRejected { reason: signal.reason, ack }));
        }

        let trade = self
            .tracker
            .close(signal.exit_price, now, signal.reason)
            .map_err(invariant)?;

        self.stats.exits += 1;
        self.stats.realised_pnl += trade.pnl;

        info!(
            trade_id = %trade.trade_id,
            reason   = %trade.reason,
            pnl      = trade.pnl,
            pnl_pct  = trade.pnl_pct,
            duration = trade.duration_secs,
            "💰 Position closed"
        );

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.log_trade(&trade) {
                warn!(error = %e, trade_id = %trade.trade_id, "Trade journal write failed");
            }
        }

        Ok(Some(OrderOutcome::Exited { trade, ack }))
    }

    async fn try_enter(
        &mut self,
        traded_price: f64,
        now: Timestamp,
    ) -> Result<Option<OrderOutcome>, EngineError> {
        let threshold = self.config.drop_pct_threshold;
        let drawdown = self.detector.compute(
            &self.history,
            &self.config.reference_symbol,
            now,
            self.config.lookback_secs as f64,
        );
        self.last_drawdown = drawdown;

        match drawdown {
            Some(dd) => debug!(drawdown_pct = dd, threshold, "Reference drawdown"),
            None => debug!("Reference drawdown n/a"),
        }

        if !self.gate.evaluate(drawdown, now, threshold) {
            if drawdown.is_some_and(|dd| dd >= threshold) && self.gate.cooldown_active(now) {
                debug!(remaining = ?self.gate.cooldown_remaining(now), "Cooldown active, skip entry");
            }
            return Ok(None);
        }

        let quantity = self.config.order_size.quantity_at(traded_price);
        let request = OrderRequest::open(
            &self.config.traded_symbol,
            Side::Short,
            quantity,
            self.config.leverage,
        );

        info!(
            reference    = %self.config.reference_symbol,
            drawdown_pct = ?drawdown,
            symbol       = %request.symbol,
            quantity,
            leverage     = request.leverage,
            price        = traded_price,
            "📉 Drawdown trigger, opening short"
        );

        // An I/O error propagates here with the trigger window intact and no
        // cooldown recorded, so the next tick retries inside the same window.
        let ack = self.orders.place_order(&request).await?;
        if !ack.success {
            self.stats.rejected_orders += 1;
            warn!(message = %ack.message, "Entry order rejected, will retry next tick");
            return Ok(Some(OrderOutcome::EntryRejected { ack }));
        }

        let position = self
            .tracker
            .open(&self.config.traded_symbol, Side::Short, quantity, traded_price, now)
            .map_err(invariant)?
            .clone();
        self.gate.record_entry(now);
        self.stats.entries += 1;

        info!(order_id = ?ack.order_id, entry_price = traded_price, "✅ Short opened");
        Ok(Some(OrderOutcome::Entered { position, ack }))
    }
}

fn validate(tick: &PriceTick) -> Result<(), EngineError> {
    if tick.is_valid() {
        Ok(())
    } else {
        warn!(symbol = %tick.symbol, price = tick.price, "Non-positive price, skipping tick");
        Err(EngineError::InvalidPrice {
            symbol: tick.symbol.clone(),
            price: tick.price,
        })
    }
}

fn invariant(e: PositionError) -> EngineError {
    error!(error = %e, "🛑 Position invariant violated");
    EngineError::Position(e)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
