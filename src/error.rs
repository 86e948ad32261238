//! # error
//!
//! Error taxonomy for the tick loop.
//!
//! | Kind               | Variant                           | Handling                          |
//! |--------------------|-----------------------------------|-----------------------------------|
//! | Data error         | `EngineError::InvalidPrice`       | abstain this tick, no mutation    |
//! | External I/O       | `PriceSource` / `OrderSink`       | failed tick, retried next poll    |
//! | Invariant breach   | `EngineError::Position`           | orchestration bug, stop the loop  |
//!
//! The monitor's HTTP surface has its own [`ApiError`] that renders JSON bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ─── Collaborator Errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PriceSourceError {
    /// Network failure or timeout while reaching the feed.
    #[error("price feed unreachable: {0}")]
    Transport(String),

    /// The feed answered but not with something we can read.
    #[error("malformed price response for {symbol}: {detail}")]
    Malformed { symbol: String, detail: String },

    /// The feed has no quote for this symbol.
    #[error("no price available for {0}")]
    UnknownSymbol(String),
}

#[derive(Debug, Error)]
pub enum OrderSinkError {
    #[error("order gateway unreachable: {0}")]
    Transport(String),

    #[error("order gateway HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("order gateway response parse error: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("trade journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trade journal CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// ─── Position Invariants ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("a position is already open on {symbol}")]
    AlreadyOpen { symbol: String },

    #[error("no open position to close")]
    NoOpenPosition,
}

// ─── EngineError ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error(transparent)]
    PriceSource(#[from] PriceSourceError),

    #[error(transparent)]
    OrderSink(#[from] OrderSinkError),

    #[error("position invariant violated: {0}")]
    Position(#[from] PositionError),
}

impl EngineError {
    /// `true` for caller-orchestration bugs. Everything else is an expected,
    /// retryable tick failure.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, EngineError::Position(_))
    }
}

// ─── ConfigError ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

// ─── ApiError (monitor HTTP surface) ──────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
