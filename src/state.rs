//! # state
//!
//! Shared monitor state: the runner writes, HTTP/WebSocket handlers read.
//! The engine itself is never shared; only its snapshots are.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};

use crate::engine::EngineSnapshot;
use crate::events::MonitorEvent;
use crate::models::ClosedTrade;

/// Closed trades kept in memory for `/api/monitor/trades`. The CSV journal
/// holds the full record.
const TRADE_HISTORY_SIZE: usize = 500;

// ─── MonitorState ─────────────────────────────────────────────────────────────

pub struct MonitorState {
    /// Latest engine snapshot. `None` until the first tick completes.
    pub snapshot: RwLock<Option<EngineSnapshot>>,

    /// Most recent closed trades, newest last.
    pub trade_history: RwLock<VecDeque<ClosedTrade>>,

    /// Pre-serialised [`MonitorEvent`] JSON for WebSocket clients.
    pub broadcast_tx: broadcast::Sender<String>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub tick_count:   AtomicU64,
    pub failed_ticks: AtomicU64,
    pub trade_count:  AtomicU64,
    pub started_at:   DateTime<Utc>,
}

impl MonitorState {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);

        Self {
            snapshot:      RwLock::new(None),
            trade_history: RwLock::new(VecDeque::with_capacity(TRADE_HISTORY_SIZE)),
            broadcast_tx,
            tick_count:    AtomicU64::new(0),
            failed_ticks:  AtomicU64::new(0),
            trade_count:   AtomicU64::new(0),
            started_at:    Utc::now(),
        }
    }

    // ── Helper Methods ────────────────────────────────────────────────────────

    /// Send to every connected client. No receivers is fine (headless run).
    pub fn broadcast(&self, event: &MonitorEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    pub async fn publish_snapshot(&self, snapshot: EngineSnapshot) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.broadcast(&MonitorEvent::Snapshot {
            snapshot: Box::new(snapshot.clone()),
        });
        *self.snapshot.write().await = Some(snapshot);
    }

    pub async fn push_trade(&self, trade: ClosedTrade) {
        self.trade_count.fetch_add(1, Ordering::Relaxed);
        let mut history = self.trade_history.write().await;
        if history.len() >= TRADE_HISTORY_SIZE {
            history.pop_front();
        }
        history.push_back(trade);
    }

    pub fn record_failure(&self, error: &str) {
        self.failed_ticks.fetch_add(1, Ordering::Relaxed);
        self.broadcast(&MonitorEvent::TickFailed {
            error: error.to_string(),
        });
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedState = Arc<MonitorState>;

pub fn build_state() -> SharedState {
    Arc::new(MonitorState::new())
}
