//! # engine::gate
//!
//! **Entry Gate**: two timers layered over the drawdown threshold.
//!
//! ```text
//! drawdown ──▶ [none?] ──▶ [≥ threshold? mark first trigger] ──▶ [cooldown?] ──▶ [window open?] ──▶ ENTER
//!                 │               │ below                            │ active         │ closed / expired
//!                 ▼               ▼                                  ▼                ▼
//!               false           false (window kept)                false            false (expired → cleared)
//! ```
//!
//! * **Trigger window**: opened by the first tick at or above threshold and
//!   judged purely on elapsed time afterwards. A dip below threshold does not
//!   close it.
//! * **Cooldown**: after a successful entry, nothing new for `cooldown_secs`.
//!
//! The cooldown check runs before the window check, so while cooling down a
//! stale window is not expired. [`EntryGate::expire_stale_trigger`] exists for
//! callers that want expiry evaluated on every tick.

use serde::Serialize;

use crate::models::Timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EntryGateState {
    pub first_trigger_ts: Option<Timestamp>,
    pub last_entry_ts: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct EntryGate {
    entry_window_secs: f64,
    cooldown_secs: f64,
    state: EntryGateState,
}

impl EntryGate {
    pub fn new(entry_window_secs: u64, cooldown_secs: u64) -> Self {
        Self {
            entry_window_secs: entry_window_secs as f64,
            cooldown_secs: cooldown_secs as f64,
            state: EntryGateState::default(),
        }
    }

    pub fn state(&self) -> EntryGateState {
        self.state
    }

    /// Decide whether a new entry is permitted this tick.
    pub fn evaluate(&mut self, drawdown_pct: Option<f64>, now_ts: Timestamp, threshold: f64) -> bool {
        let Some(drawdown) = drawdown_pct else {
            return false;
        };

        if drawdown >= threshold {
            if self.state.first_trigger_ts.is_none() {
                self.state.first_trigger_ts = Some(now_ts);
            }
        } else {
            return false;
        }

        if self.cooldown_active(now_ts) {
            return false;
        }

        match self.state.first_trigger_ts {
            None => false,
            Some(first) if now_ts - first > self.entry_window_secs => {
                self.state.first_trigger_ts = None;
                false
            }
            Some(_) => true,
        }
    }

    /// Record a consummated entry; starts the cooldown.
    pub fn record_entry(&mut self, now_ts: Timestamp) {
        self.state.last_entry_ts = Some(now_ts);
    }

    /// Clear the trigger window if it has elapsed. Returns `true` if cleared.
    pub fn expire_stale_trigger(&mut self, now_ts: Timestamp) -> bool {
        match self.state.first_trigger_ts {
            Some(first) if now_ts - first > self.entry_window_secs => {
                self.state.first_trigger_ts = None;
                true
            }
            _ => false,
        }
    }

    pub fn cooldown_active(&self, now_ts: Timestamp) -> bool {
        self.state
            .last_entry_ts
            .is_some_and(|last| now_ts - last < self.cooldown_secs)
    }

    /// Seconds until the cooldown ends, if one is running.
    pub fn cooldown_remaining(&self, now_ts: Timestamp) -> Option<f64> {
        self.state
            .last_entry_ts
            .map(|last| self.cooldown_secs - (now_ts - last))
            .filter(|remaining| *remaining > 0.0)
    }

    pub fn window_active(&self, now_ts: Timestamp) -> bool {
        self.state
            .first_trigger_ts
            .is_some_and(|first| now_ts - first <= self.entry_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 1.0;

    fn gate() -> EntryGate {
        EntryGate::new(600, 900)
    }

    #[test]
    fn test_none_drawdown_is_no_op() {
        let mut g = gate();
        assert!(!g.evaluate(None, 0.0, THRESHOLD));
        assert_eq!(g.state(), EntryGateState::default());
    }

    #[test]
    fn test_first_crossing_opens_window_and_allows_entry() {
        let mut g = gate();
        assert!(g.evaluate(Some(1.0), 300.0, THRESHOLD));
        assert_eq!(g.state().first_trigger_ts, Some(300.0));
    }

    #[test]
    fn test_repeated_crossing_does_not_restart_window() {
        let mut g = gate();
        g.evaluate(Some(1.5), 100.0, THRESHOLD);
        g.evaluate(Some(2.0), 200.0, THRESHOLD);
        assert_eq!(g.state().first_trigger_ts, Some(100.0));
    }

    #[test]
    fn test_below_threshold_tick_keeps_window() {
        let mut g = gate();
        g.evaluate(Some(1.2), 100.0, THRESHOLD);
        assert!(!g.evaluate(Some(0.2), 150.0, THRESHOLD));
        assert_eq!(g.state().first_trigger_ts, Some(100.0));
        // back above threshold inside the same window
        assert!(g.evaluate(Some(1.1), 650.0, THRESHOLD));
    }

    #[test]
    fn test_expired_window_is_cleared_then_reopened() {
        let mut g = gate();
        g.evaluate(Some(1.2), 0.0, THRESHOLD);
        // window edge is inclusive
        assert!(g.evaluate(Some(1.2), 600.0, THRESHOLD));
        assert!(!g.evaluate(Some(1.2), 601.0, THRESHOLD));
        assert_eq!(g.state().first_trigger_ts, None);
        // next crossing starts a fresh window
        assert!(g.evaluate(Some(1.2), 602.0, THRESHOLD));
        assert_eq!(g.state().first_trigger_ts, Some(602.0));
    }

    #[test]
    fn test_cooldown_blocks_until_elapsed() {
        let mut g = EntryGate::new(10_000, 900);
        assert!(g.evaluate(Some(1.0), 300.0, THRESHOLD));
        g.record_entry(300.0);

        for t in [301.0, 600.0, 1199.0] {
            assert!(!g.evaluate(Some(5.0), t, THRESHOLD), "entered during cooldown at {t}");
        }
        assert_eq!(g.cooldown_remaining(1100.0), Some(100.0));
        assert!(g.evaluate(Some(5.0), 1200.0, THRESHOLD));
        assert_eq!(g.cooldown_remaining(1200.0), None);
    }

    #[test]
    fn test_cooldown_masks_window_expiry() {
        let mut g = gate();
        g.evaluate(Some(1.0), 0.0, THRESHOLD);
        g.record_entry(0.0);
        // window (600s) long gone, but cooldown (900s) short-circuits first
        assert!(!g.evaluate(Some(1.0), 800.0, THRESHOLD));
        assert_eq!(g.state().first_trigger_ts, Some(0.0));
        assert!(!g.window_active(800.0));
    }

    #[test]
    fn test_expire_stale_trigger() {
        let mut g = gate();
        g.evaluate(Some(1.0), 0.0, THRESHOLD);
        assert!(!g.expire_stale_trigger(600.0));
        assert!(g.expire_stale_trigger(600.5));
        assert_eq!(g.state().first_trigger_ts, None);
        assert!(!g.expire_stale_trigger(700.0));
    }
}
