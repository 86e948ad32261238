//! # models::position
//!
//! Structs for the **live position** and the **closed trade** it turns into.
//!
//! `Position`    = what the tracker holds while exposure is open
//! `ExitSignal`  = SL/TP evaluation result for the current tick
//! `ClosedTrade` = realised result, handed to the trade journal and monitor

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tick::Timestamp;

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Profits when price falls; closed by buying back.
    Short,
    Long,
}

impl Side {
    /// `-1` for Short, `+1` for Long. Multiplies `(exit - entry)` into PnL.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Short => -1.0,
            Side::Long => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Short => "SHORT",
            Side::Long => "LONG",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ExitReason ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    /// Take-profit level reached.
    Tp,
    /// Stop-loss level reached.
    Sl,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Tp => "tp",
            ExitReason::Sl => "sl",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Position ─────────────────────────────────────────────────────────────────

/// The single open position. Created on an accepted entry order and
/// destroyed on an accepted exit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_ts: Timestamp,
}

impl Position {
    /// Unrealised PnL at `current_price`, in quote currency.
    pub fn unrealised_pnl(&self, current_price: f64) -> f64 {
        self.side.sign() * (current_price - self.entry_price) * self.quantity
    }

    /// Take-profit trigger level for this position.
    pub fn take_profit_level(&self, tp_pct: f64) -> f64 {
        match self.side {
            Side::Short => self.entry_price * (1.0 - tp_pct / 100.0),
            Side::Long => self.entry_price * (1.0 + tp_pct / 100.0),
        }
    }

    /// Stop-loss trigger level for this position.
    pub fn stop_loss_level(&self, sl_pct: f64) -> f64 {
        match self.side {
            Side::Short => self.entry_price * (1.0 + sl_pct / 100.0),
            Side::Long => self.entry_price * (1.0 - sl_pct / 100.0),
        }
    }
}

// ─── ExitSignal ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitSignal {
    pub reason: ExitReason,
    pub exit_price: f64,
}

// ─── ClosedTrade ──────────────────────────────────────────────────────────────

/// Realised round trip. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub trade_id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub entry_ts: Timestamp,
    pub exit_ts: Timestamp,
    pub duration_secs: f64,
    pub reason: ExitReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_at(entry: f64) -> Position {
        Position {
            symbol: "ETHUSDT".into(),
            side: Side::Short,
            quantity: 2.0,
            entry_price: entry,
            entry_ts: 0.0,
        }
    }

    #[test]
    fn test_short_levels_mirror_long() {
        let short = short_at(100.0);
        assert!((short.take_profit_level(2.0) - 98.0).abs() < 1e-9);
        assert!((short.stop_loss_level(2.0) - 102.0).abs() < 1e-9);

        let long = Position { side: Side::Long, ..short_at(100.0) };
        assert!((long.take_profit_level(2.0) - 102.0).abs() < 1e-9);
        assert!((long.stop_loss_level(2.0) - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrealised_pnl_sign() {
        let short = short_at(100.0);
        assert!((short.unrealised_pnl(95.0) - 10.0).abs() < 1e-9);
        assert!((short.unrealised_pnl(105.0) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_exit_reason_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&ExitReason::Sl).unwrap(), "\"sl\"");
        assert_eq!(ExitReason::Tp.to_string(), "tp");
    }
}
