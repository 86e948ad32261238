//! # exchange::dry_run
//!
//! Paper sink: validates the request, logs it, and acknowledges with a
//! synthetic `dry-…` order id. Nothing leaves the process.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::OrderSinkError;
use crate::exchange::OrderSink;
use crate::models::{OrderAck, OrderRequest};

pub struct DryRunOrderSink<C: Clock> {
    clock: C,
    placed: AtomicU64,
}

impl<C: Clock> DryRunOrderSink<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            placed: AtomicU64::new(0),
        }
    }

    /// Orders accepted so far.
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<C: Clock> OrderSink for DryRunOrderSink<C> {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderSinkError> {
        let now = self.clock.now();

        if let Some(reason) = request.validate() {
            warn!(reason, symbol = %request.symbol, "🎭 [DRY-RUN] Order rejected");
            return Ok(OrderAck::rejected(reason, now));
        }

        let seq = self.placed.fetch_add(1, Ordering::Relaxed) + 1;
        let order_id = format!("dry-{}-{seq}", (now * 1000.0) as i64);
        let message = format!(
            "DRY_RUN: placed {} {} {} x{}{}",
            request.side.as_str(),
            request.quantity,
            request.symbol,
            request.leverage,
            if request.reduce_only { " (reduce-only)" } else { "" },
        );

        info!(order_id = %order_id, "🎭 [DRY-RUN] {message}");
        Ok(OrderAck::accepted(order_id, message, now))
    }
}
