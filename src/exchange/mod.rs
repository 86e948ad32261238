//! # exchange
//!
//! Order sinks: where the engine's order intents go.
//!
//! * [`DryRunOrderSink`]: validates and accepts everything locally. Default.
//! * [`GatewayOrderSink`]: JSON over HTTP to an order-gateway bridge that
//!   owns venue credentials and request signing.

use async_trait::async_trait;

use crate::error::OrderSinkError;
use crate::models::{OrderAck, OrderRequest, Side};

pub mod dry_run;
pub mod gateway;

pub use dry_run::DryRunOrderSink;
pub use gateway::GatewayOrderSink;

#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit an order. `Ok` with `success = false` is a venue rejection;
    /// `Err` means we never got an answer.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderSinkError>;

    /// Flatten `quantity` of a position held on `side`.
    async fn close_position(
        &self,
        symbol: &str,
        quantity: f64,
        side: Side,
    ) -> Result<OrderAck, OrderSinkError> {
        self.place_order(&OrderRequest::close(symbol, side, quantity)).await
    }
}
