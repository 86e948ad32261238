//! # models::tick
//!
//! Defines [`PriceTick`], a single price observation returned by a
//! [`PriceSource`](crate::feeds::PriceSource) and stored in
//! [`PriceHistory`](crate::engine::history::PriceHistory).
//!
//! Timestamps are plain seconds (`f64`). Live feeds stamp with wall-clock time;
//! replay runs stamp with a [`ManualClock`](crate::clock::ManualClock), so the
//! engine never needs to know which one it is talking to.

use serde::{Deserialize, Serialize};

/// Seconds since an arbitrary epoch. Only differences between timestamps matter.
pub type Timestamp = f64;

/// A single price sample. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// The trading symbol, e.g. `"BTCUSDT"`.
    pub symbol: String,

    /// Last traded (or mid) price reported by the feed.
    pub price: f64,

    /// When the feed observed this price.
    pub timestamp: Timestamp,
}

impl PriceTick {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    /// A tick is usable only if its price is finite and strictly positive.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
