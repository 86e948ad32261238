//! # feeds::binance
//!
//! Public Binance REST ticker. No auth.
//!
//! ```json
//! { "symbol": "BTCUSDT", "price": "68000.00" }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::PriceSourceError;
use crate::feeds::{PriceSource, FEED_TIMEOUT};
use crate::models::PriceTick;

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    /// Binance sends prices as strings.
    price: String,
}

pub struct BinancePriceSource<C: Clock> {
    client: reqwest::Client,
    base_url: String,
    clock: C,
}

impl<C: Clock> BinancePriceSource<C> {
    pub fn new(client: reqwest::Client, base_url: &str, clock: C) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }
}

fn parse_ticker(symbol: &str, body: TickerPrice) -> Result<f64, PriceSourceError> {
    if body.symbol != symbol {
        return Err(PriceSourceError::Malformed {
            symbol: symbol.to_string(),
            detail: format!("response was for {}", body.symbol),
        });
    }
    body.price.parse().map_err(|_| PriceSourceError::Malformed {
        symbol: symbol.to_string(),
        detail: format!("price {:?} is not a number", body.price),
    })
}

#[async_trait]
impl<C: Clock> PriceSource for BinancePriceSource<C> {
    async fn get_price(&self, symbol: &str) -> Result<PriceTick, PriceSourceError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .timeout(FEED_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, symbol, "Binance unreachable");
                PriceSourceError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // 400 {"code":-1121,"msg":"Invalid symbol."}
            if status == reqwest::StatusCode::BAD_REQUEST && body.contains("-1121") {
                return Err(PriceSourceError::UnknownSymbol(symbol.to_string()));
            }
            return Err(PriceSourceError::Transport(format!("Binance HTTP {status}: {body}")));
        }

        let body: TickerPrice = response.json().await.map_err(|e| PriceSourceError::Malformed {
            symbol: symbol.to_string(),
            detail: e.to_string(),
        })?;

        let price = parse_ticker(symbol, body)?;
        debug!(symbol, price, "Binance price");
        Ok(PriceTick::new(symbol, price, self.clock.now()))
    }
}
