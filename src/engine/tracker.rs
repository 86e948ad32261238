//! # engine::tracker
//!
//! **Position Tracker**: owns zero or one [`Position`] and evaluates
//! stop-loss / take-profit against it.
//!
//! ## Exit precedence
//! If one tick gaps through both levels, stop-loss wins. Loss containment
//! comes before profit-taking.

use tracing::debug;
use uuid::Uuid;

use crate::error::PositionError;
use crate::models::{ClosedTrade, ExitReason, ExitSignal, Position, Side, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    position: Option<Position>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn open(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        ts: Timestamp,
    ) -> Result<&Position, PositionError> {
        if let Some(existing) = &self.position {
            return Err(PositionError::AlreadyOpen {
                symbol: existing.symbol.clone(),
            });
        }

        Ok(self.position.insert(Position {
            symbol: symbol.to_string(),
            side,
            quantity,
            entry_price: price,
            entry_ts: ts,
        }))
    }

    /// `None` when flat or when neither level is crossed.
    pub fn check_exit(&self, current_price: f64, sl_pct: f64, tp_pct: f64) -> Option<ExitSignal> {
        let pos = self.position.as_ref()?;
        let sl = pos.stop_loss_level(sl_pct);
        let tp = pos.take_profit_level(tp_pct);

        let (sl_hit, tp_hit) = match pos.side {
            Side::Short => (current_price >= sl, current_price <= tp),
            Side::Long => (current_price <= sl, current_price >= tp),
        };

        debug!(current_price, sl, tp, sl_hit, tp_hit, "exit check");

        let reason = if sl_hit {
            ExitReason::Sl
        } else if tp_hit {
            ExitReason::Tp
        } else {
            return None;
        };

        Some(ExitSignal {
            reason,
            exit_price: current_price,
        })
    }

    /// Realise the open position at `exit_price` and clear it.
    pub fn close(
        &mut self,
        exit_price: f64,
        ts: Timestamp,
        reason: ExitReason,
    ) -> Result<ClosedTrade, PositionError> {
        let pos = self.position.take().ok_or(PositionError::NoOpenPosition)?;
        let sign = pos.side.sign();

        Ok(ClosedTrade {
            trade_id: Uuid::new_v4(),
            pnl: sign * (exit_price - pos.entry_price) * pos.quantity,
            pnl_pct: sign * (exit_price - pos.entry_price) / pos.entry_price * 100.0,
            duration_secs: ts - pos.entry_ts,
            symbol: pos.symbol,
            side: pos.side,
            quantity: pos.quantity,
            entry_price: pos.entry_price,
            exit_price,
            entry_ts: pos.entry_ts,
            exit_ts: ts,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_at_100() -> PositionTracker {
        let mut t = PositionTracker::new();
        t.open("ETHUSDT", Side::Short, 1.0, 100.0, 0.0).unwrap();
        t
    }

    #[test]
    fn test_open_twice_fails() {
        let mut t = short_at_100();
        let err = t.open("ETHUSDT", Side::Short, 1.0, 99.0, 5.0).unwrap_err();
        assert_eq!(err, PositionError::AlreadyOpen { symbol: "ETHUSDT".into() });
        assert_eq!(t.position().unwrap().entry_price, 100.0);
    }

    #[test]
    fn test_close_when_flat_fails() {
        let mut t = PositionTracker::new();
        assert_eq!(t.close(100.0, 1.0, ExitReason::Tp), Err(PositionError::NoOpenPosition));
    }

    #[test]
    fn test_no_exit_between_levels() {
        let t = short_at_100();
        assert_eq!(t.check_exit(100.0, 2.0, 2.0), None);
        assert_eq!(t.check_exit(101.9, 2.0, 2.0), None);
        assert_eq!(t.check_exit(98.1, 2.0, 2.0), None);
        assert_eq!(PositionTracker::new().check_exit(50.0, 2.0, 2.0), None);
    }

    #[test]
    fn test_short_take_profit_at_98() {
        let mut t = short_at_100();
        let exit = t.check_exit(98.0, 2.0, 2.0).unwrap();
        assert_eq!(exit.reason, ExitReason::Tp);

        let trade = t.close(exit.exit_price, 60.0, exit.reason).unwrap();
        assert!((trade.pnl - 2.0).abs() < 1e-9);
        assert!((trade.pnl_pct - 2.0).abs() < 1e-9);
        assert_eq!(trade.duration_secs, 60.0);
        assert!(!t.is_open());
    }

    #[test]
    fn test_short_stop_loss_at_102() {
        let mut t = short_at_100();
        let exit = t.check_exit(102.0, 2.0, 2.0).unwrap();
        assert_eq!(exit.reason, ExitReason::Sl);

        let trade = t.close(exit.exit_price, 60.0, exit.reason).unwrap();
        assert!((trade.pnl + 2.0).abs() < 1e-9);
        assert!((trade.pnl_pct + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_loss_wins_when_both_levels_hold() {
        // Negative TP puts the TP level above entry, so a single price
        // satisfies both conditions.
        let t = short_at_100();
        let exit = t.check_exit(103.0, 2.0, -5.0).unwrap();
        assert_eq!(exit.reason, ExitReason::Sl);
    }

    #[test]
    fn test_long_mirrors_short() {
        let mut t = PositionTracker::new();
        t.open("ETHUSDT", Side::Long, 2.0, 100.0, 0.0).unwrap();
        assert_eq!(t.check_exit(102.0, 2.0, 2.0).unwrap().reason, ExitReason::Tp);
        assert_eq!(t.check_exit(98.0, 2.0, 2.0).unwrap().reason, ExitReason::Sl);

        let trade = t.close(102.0, 10.0, ExitReason::Tp).unwrap();
        assert!((trade.pnl - 4.0).abs() < 1e-9);
    }
}
