//! # feeds::hyperliquid
//!
//! Mid prices from Hyperliquid's info endpoint. One `allMids` call returns
//! every coin; symbols are mapped to coins by stripping a `USDT`/`USDC` suffix.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::PriceSourceError;
use crate::feeds::{PriceSource, FEED_TIMEOUT};
use crate::models::PriceTick;

/// `"ETHUSDT"` → `"ETH"`. Anything without a known quote suffix passes through.
pub fn coin_from_symbol(symbol: &str) -> &str {
    symbol
        .strip_suffix("USDT")
        .or_else(|| symbol.strip_suffix("USDC"))
        .unwrap_or(symbol)
}

pub struct HyperliquidPriceSource<C: Clock> {
    client: reqwest::Client,
    base_url: String,
    clock: C,
}

impl<C: Clock> HyperliquidPriceSource<C> {
    pub fn new(client: reqwest::Client, base_url: &str, clock: C) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }
}

fn mid_for(symbol: &str, mids: &HashMap<String, String>) -> Result<f64, PriceSourceError> {
    let coin = coin_from_symbol(symbol);
    let raw = mids
        .get(coin)
        .ok_or_else(|| PriceSourceError::UnknownSymbol(symbol.to_string()))?;
    raw.parse().map_err(|_| PriceSourceError::Malformed {
        symbol: symbol.to_string(),
        detail: format!("mid {raw:?} for {coin} is not a number"),
    })
}

#[async_trait]
impl<C: Clock> PriceSource for HyperliquidPriceSource<C> {
    async fn get_price(&self, symbol: &str) -> Result<PriceTick, PriceSourceError> {
        let url = format!("{}/info", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "type": "allMids" }))
            .timeout(FEED_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, symbol, "Hyperliquid unreachable");
                PriceSourceError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PriceSourceError::Transport(format!("Hyperliquid HTTP {status}: {body}")));
        }

        let mids: HashMap<String, String> =
            response.json().await.map_err(|e| PriceSourceError::Malformed {
                symbol: symbol.to_string(),
                detail: e.to_string(),
            })?;

        let price = mid_for(symbol, &mids)?;
        debug!(symbol, price, "Hyperliquid mid");
        Ok(PriceTick::new(symbol, price, self.clock.now()))
    }
}
