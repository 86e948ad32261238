//! # engine::drawdown
//!
//! Decline of a symbol's latest price from its local maximum inside a
//! lookback window, in percent.

use crate::engine::history::PriceHistory;
use crate::models::Timestamp;

#[derive(Debug, Clone, Copy, Default)]
pub struct DrawdownDetector;

impl DrawdownDetector {
    /// `None` when there is no sample in `[now − lookback, now]`, or when the
    /// local maximum is not positive (corrupt data; we abstain rather than fail).
    pub fn compute(
        &self,
        history: &PriceHistory,
        symbol: &str,
        now_ts: Timestamp,
        lookback_secs: f64,
    ) -> Option<f64> {
        let cutoff = now_ts - lookback_secs;
        let local_max = history
            .since(symbol, cutoff)
            .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |m| m.max(p))))?;

        if local_max <= 0.0 {
            return None;
        }

        // The latest sample is always inside its own window, so this is the
        // same sample set the maximum was taken over.
        let current = history.current(symbol)?;
        Some((local_max - current) / local_max * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(prices: &[(f64, f64)]) -> PriceHistory {
        let mut history = PriceHistory::new(1200);
        for &(ts, price) in prices {
            history.record("BTCUSDT", price, ts);
        }
        history
    }

    #[test]
    fn test_no_data_returns_none() {
        let history = PriceHistory::new(1200);
        assert_eq!(DrawdownDetector.compute(&history, "BTCUSDT", 100.0, 300.0), None);
    }

    #[test]
    fn test_stale_data_returns_none() {
        let history = feed(&[(0.0, 100.0)]);
        assert_eq!(DrawdownDetector.compute(&history, "BTCUSDT", 1000.0, 300.0), None);
    }

    #[test]
    fn test_one_percent_drop_from_local_max() {
        let history = feed(&[(0.0, 100.0), (150.0, 99.5), (300.0, 99.0)]);
        let dd = DrawdownDetector.compute(&history, "BTCUSDT", 300.0, 300.0).unwrap();
        assert!((dd - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_outside_lookback_is_ignored() {
        let history = feed(&[(0.0, 200.0), (500.0, 100.0), (600.0, 99.0)]);
        let dd = DrawdownDetector.compute(&history, "BTCUSDT", 600.0, 300.0).unwrap();
        assert!((dd - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rising_price_has_zero_drawdown() {
        let history = feed(&[(0.0, 100.0), (10.0, 101.0)]);
        assert_eq!(DrawdownDetector.compute(&history, "BTCUSDT", 10.0, 300.0), Some(0.0));
    }

    #[test]
    fn test_non_positive_max_abstains() {
        let history = feed(&[(0.0, 0.0), (10.0, -1.0)]);
        assert_eq!(DrawdownDetector.compute(&history, "BTCUSDT", 10.0, 300.0), None);
    }

    proptest! {
        #[test]
        fn prop_monotone_for_decreasing_prices(
            drops in proptest::collection::vec(0.001f64..5.0, 2..60),
        ) {
            let lookback = 300.0;
            let mut history = PriceHistory::new(1200);
            let mut price = 1000.0;
            let mut prev = 0.0;
            // all samples fall inside one lookback window
            for (i, d) in drops.iter().enumerate() {
                let ts = i as f64;
                price -= d;
                history.record("BTCUSDT", price, ts);
                let dd = DrawdownDetector.compute(&history, "BTCUSDT", ts, lookback).unwrap();
                prop_assert!(dd >= prev);
                prev = dd;
            }
        }
    }
}
