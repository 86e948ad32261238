//! # routes::monitor
//!
//! ## Endpoints
//!
//! | Method    | Path                    | Description                                  |
//! |-----------|-------------------------|----------------------------------------------|
//! | GET       | `/api/health`           | Liveness + uptime                            |
//! | GET       | `/api/monitor/status`   | Latest engine snapshot and tick counters     |
//! | GET       | `/api/monitor/position` | Open position, 404 when flat                 |
//! | GET       | `/api/monitor/trades`   | Recent closed trades                         |
//! | GET (WS)  | `/ws/monitor`           | Real-time [`MonitorEvent`] stream            |

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::events::MonitorEvent;
use crate::state::SharedState;

// ─── WebSocket Handler ────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    // ── Current snapshot first ────────────────────────────────────────────────
    let snapshot = state.snapshot.read().await.clone();
    if let Some(snapshot) = snapshot {
        let event = MonitorEvent::Snapshot { snapshot: Box::new(snapshot) };
        if sender.send(Message::Text(event.to_json())).await.is_err() {
            return;
        }
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── REST Endpoints ───────────────────────────────────────────────────────────

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok":          true,
        "service":     "dropshort",
        "uptime_secs": state.uptime_secs(),
    }))
}

/// GET /api/monitor/status
pub async fn get_status(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await.clone();
    Json(json!({
        "ok":           true,
        "tick_count":   state.tick_count.load(Ordering::Relaxed),
        "failed_ticks": state.failed_ticks.load(Ordering::Relaxed),
        "trade_count":  state.trade_count.load(Ordering::Relaxed),
        "snapshot":     snapshot,
    }))
}

/// GET /api/monitor/position
pub async fn get_position(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.snapshot.read().await;
    let position = snapshot
        .as_ref()
        .and_then(|s| s.position.clone())
        .ok_or_else(|| ApiError::NotFound("no open position".to_string()))?;

    let unrealised_pnl = snapshot.as_ref().and_then(|s| s.unrealised_pnl);
    Ok(Json(json!({
        "ok":             true,
        "position":       position,
        "unrealised_pnl": unrealised_pnl,
    })))
}

/// GET /api/monitor/trades
pub async fn get_trades(State(state): State<SharedState>) -> impl IntoResponse {
    let history = state.trade_history.read().await;
    Json(json!({
        "ok":      true,
        "count":   history.len(),
        "records": *history,
    }))
}
