//! # engine::history
//!
//! Per-symbol rolling price buffer.
//!
//! Samples arrive in time order, so eviction is FIFO from the front: on every
//! `record` we drop samples older than `latest − retention`. Unknown symbols
//! behave like empty buffers.

use std::collections::{HashMap, VecDeque};

use crate::models::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    ts: Timestamp,
    price: f64,
}

#[derive(Debug, Clone)]
pub struct PriceHistory {
    retention_secs: f64,
    series: HashMap<String, VecDeque<Sample>>,
}

impl PriceHistory {
    pub fn new(retention_secs: u64) -> Self {
        Self {
            retention_secs: retention_secs as f64,
            series: HashMap::new(),
        }
    }

    pub fn retention_secs(&self) -> f64 {
        self.retention_secs
    }

    /// Append a sample and evict everything older than `timestamp − retention`.
    pub fn record(&mut self, symbol: &str, price: f64, timestamp: Timestamp) {
        let buf = self.series.entry(symbol.to_string()).or_default();
        buf.push_back(Sample { ts: timestamp, price });

        let cutoff = timestamp - self.retention_secs;
        while buf.front().is_some_and(|s| s.ts < cutoff) {
            buf.pop_front();
        }
    }

    /// Most recently recorded price.
    pub fn current(&self, symbol: &str) -> Option<f64> {
        self.latest(symbol).map(|(_, price)| price)
    }

    /// Most recently recorded `(timestamp, price)`.
    pub fn latest(&self, symbol: &str) -> Option<(Timestamp, f64)> {
        self.series
            .get(symbol)
            .and_then(|buf| buf.back())
            .map(|s| (s.ts, s.price))
    }

    /// Prices with `timestamp ≥ cutoff`, oldest first. Borrowing, so it can be
    /// called again to restart the sequence.
    pub fn since<'a>(&'a self, symbol: &str, cutoff: Timestamp) -> impl Iterator<Item = f64> + 'a {
        self.series
            .get(symbol)
            .into_iter()
            .flat_map(|buf| buf.iter())
            .filter(move |s| s.ts >= cutoff)
            .map(|s| s.price)
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.series.get(symbol).map_or(0, VecDeque::len)
    }

    /// Oldest retained timestamp for `symbol`.
    pub fn oldest_ts(&self, symbol: &str) -> Option<Timestamp> {
        self.series.get(symbol).and_then(|buf| buf.front()).map(|s| s.ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unknown_symbol_is_empty() {
        let history = PriceHistory::new(1200);
        assert_eq!(history.current("BTCUSDT"), None);
        assert_eq!(history.since("BTCUSDT", 0.0).count(), 0);
        assert_eq!(history.len("BTCUSDT"), 0);
    }

    #[test]
    fn test_current_and_since() {
        let mut history = PriceHistory::new(1200);
        history.record("BTCUSDT", 100.0, 0.0);
        history.record("BTCUSDT", 101.0, 10.0);
        history.record("BTCUSDT", 99.0, 20.0);
        history.record("ETHUSDT", 3000.0, 20.0);

        assert_eq!(history.current("BTCUSDT"), Some(99.0));
        assert_eq!(history.since("BTCUSDT", 10.0).collect::<Vec<_>>(), vec![101.0, 99.0]);
        // restartable
        assert_eq!(history.since("BTCUSDT", 10.0).count(), 2);
        assert_eq!(history.since("ETHUSDT", 0.0).collect::<Vec<_>>(), vec![3000.0]);
    }

    #[test]
    fn test_evicts_from_front_on_insert() {
        let mut history = PriceHistory::new(100);
        history.record("BTCUSDT", 1.0, 0.0);
        history.record("BTCUSDT", 2.0, 50.0);
        history.record("BTCUSDT", 3.0, 100.0);
        assert_eq!(history.len("BTCUSDT"), 3); // t=0 sits exactly on the cutoff

        history.record("BTCUSDT", 4.0, 151.0);
        assert_eq!(history.since("BTCUSDT", f64::MIN).collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!(history.oldest_ts("BTCUSDT"), Some(100.0));
    }

    #[test]
    fn test_thousand_samples_keep_only_retention() {
        // lookback 900s → default retention 1800s = 2 × lookback
        let lookback = 900.0;
        let mut history = PriceHistory::new(1800);
        let span = 3.0 * lookback;
        for i in 0..1000 {
            let ts = span * i as f64 / 999.0;
            history.record("BTCUSDT", 100.0 + i as f64, ts);
        }
        let (latest, _) = history.latest("BTCUSDT").unwrap();
        let oldest = history.oldest_ts("BTCUSDT").unwrap();
        assert!(latest - oldest <= 2.0 * lookback);
        assert_eq!(history.since("BTCUSDT", f64::MIN).count(), history.len("BTCUSDT"));
        assert!(history.since("BTCUSDT", latest - 2.0 * lookback).count() == history.len("BTCUSDT"));
        assert!(history.len("BTCUSDT") < 1000);
    }

    proptest! {
        #[test]
        fn prop_retained_samples_within_retention(
            steps in proptest::collection::vec(0.0f64..50.0, 1..300),
            retention in 10u64..500,
        ) {
            let mut history = PriceHistory::new(retention);
            let mut ts = 0.0;
            for step in steps {
                ts += step;
                history.record("BTCUSDT", 100.0, ts);
                let (latest, _) = history.latest("BTCUSDT").unwrap();
                let oldest = history.oldest_ts("BTCUSDT").unwrap();
                prop_assert!(oldest >= latest - retention as f64);
            }
        }
    }
}
