//! # feeds
//!
//! Price sources the engine polls once per tick.
//!
//! | Source                  | Endpoint                               |
//! |-------------------------|----------------------------------------|
//! | [`BinancePriceSource`]  | `GET /api/v3/ticker/price?symbol=…`    |
//! | [`HyperliquidPriceSource`] | `POST /info {"type":"allMids"}`     |
//! | [`ManualPriceSource`]   | in-memory, for `once` / `replay` runs  |

use async_trait::async_trait;

use crate::error::PriceSourceError;
use crate::models::PriceTick;

pub mod binance;
pub mod hyperliquid;
pub mod manual;

pub use binance::BinancePriceSource;
pub use hyperliquid::HyperliquidPriceSource;
pub use manual::ManualPriceSource;

/// Per-request timeout for live feeds.
pub(crate) const FEED_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch a fresh tick for `symbol`. Transient failures surface as errors;
    /// the caller decides whether to retry.
    async fn get_price(&self, symbol: &str) -> Result<PriceTick, PriceSourceError>;
}
