//! # routes
//!
//! Read-only monitor surface. Nothing here can place or cancel orders.

use axum::{routing::get, Router};

use crate::state::SharedState;

pub mod monitor;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health",           get(monitor::health))
        .route("/api/monitor/status",   get(monitor::get_status))
        .route("/api/monitor/position", get(monitor::get_position))
        .route("/api/monitor/trades",   get(monitor::get_trades))
        .route("/ws/monitor",           get(monitor::ws_monitor))
        .with_state(state)
}
