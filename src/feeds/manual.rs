//! # feeds::manual
//!
//! Settable prices for one-shot and replay runs (and tests). Ticks are
//! stamped with the shared clock so they line up with the engine's "now".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::clock::Clock;
use crate::error::PriceSourceError;
use crate::feeds::PriceSource;
use crate::models::PriceTick;

/// Clones share the same price table.
#[derive(Debug, Clone)]
pub struct ManualPriceSource<C: Clock> {
    prices: Arc<RwLock<HashMap<String, f64>>>,
    clock: C,
}

impl<C: Clock> ManualPriceSource<C> {
    pub fn new(clock: C) -> Self {
        Self {
            prices: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl<C: Clock> PriceSource for ManualPriceSource<C> {
    async fn get_price(&self, symbol: &str) -> Result<PriceTick, PriceSourceError> {
        let price = self
            .prices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceSourceError::UnknownSymbol(symbol.to_string()))?;

        Ok(PriceTick::new(symbol, price, self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_unset_symbol_errors() {
        let source = ManualPriceSource::new(ManualClock::new(0.0));
        assert!(matches!(
            source.get_price("BTCUSDT").await,
            Err(PriceSourceError::UnknownSymbol(_))
        ));
    }

    #[tokio::test]
    async fn test_ticks_use_clock_time() {
        let clock = ManualClock::new(42.0);
        let source = ManualPriceSource::new(clock.clone());
        source.set_price("BTCUSDT", 67000.0);

        let tick = source.get_price("BTCUSDT").await.unwrap();
        assert_eq!(tick, PriceTick::new("BTCUSDT", 67000.0, 42.0));

        clock.advance(2.0);
        source.clone().set_price("BTCUSDT", 66000.0);
        let tick = source.get_price("BTCUSDT").await.unwrap();
        assert_eq!((tick.price, tick.timestamp), (66000.0, 44.0));
    }
}
