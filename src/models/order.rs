//! # models::order
//!
//! Order intents the engine hands to an [`OrderSink`](crate::exchange::OrderSink)
//! and the acknowledgement it gets back.
//!
//! An [`OrderAck`] with `success = true` only means the venue *accepted* the
//! order. Fill confirmation is never assumed beyond that.

use serde::{Deserialize, Serialize};

use crate::models::position::Side;
use crate::models::tick::Timestamp;

// ─── OrderSide ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side of the order that *opens* a position of `side`.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Short => OrderSide::Sell,
            Side::Long => OrderSide::Buy,
        }
    }

    /// Side of the order that *closes* a position of `side`.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Short => OrderSide::Buy,
            Side::Long => OrderSide::Sell,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

// ─── OrderRequest ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    /// Size in coins.
    pub quantity: f64,
    pub leverage: f64,
    /// `None` = market order.
    pub limit_price: Option<f64>,
    /// Exit orders may only reduce exposure.
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Market order that opens a position of `side`.
    pub fn open(symbol: &str, side: Side, quantity: f64, leverage: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::opening(side),
            quantity,
            leverage,
            limit_price: None,
            reduce_only: false,
        }
    }

    /// Reduce-only market order that flattens a position of `side`.
    pub fn close(symbol: &str, side: Side, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::closing(side),
            quantity,
            leverage: 1.0,
            limit_price: None,
            reduce_only: true,
        }
    }

    /// Returns a human-readable reason if the request can never be accepted.
    pub fn validate(&self) -> Option<&'static str> {
        if self.symbol.is_empty() {
            return Some("symbol must be a non-empty string");
        }
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Some("quantity must be positive");
        }
        if !(self.leverage.is_finite() && self.leverage > 0.0) {
            return Some("leverage must be positive");
        }
        if let Some(px) = self.limit_price {
            if !(px.is_finite() && px > 0.0) {
                return Some("limit price must be positive");
            }
        }
        None
    }
}

// ─── OrderAck ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub success: bool,
    pub order_id: Option<String>,
    pub message: String,
    pub timestamp: Timestamp,
}

impl OrderAck {
    pub fn accepted(order_id: impl Into<String>, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            success: true,
            order_id: Some(order_id.into()),
            message: message.into(),
            timestamp,
        }
    }

    pub fn rejected(message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            success: false,
            order_id: None,
            message: message.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_opens_with_sell_and_closes_with_buy() {
        let open = OrderRequest::open("ETHUSDT", Side::Short, 1.0, 3.0);
        assert_eq!(open.side, OrderSide::Sell);
        assert!(!open.reduce_only);

        let close = OrderRequest::close("ETHUSDT", Side::Short, 1.0);
        assert_eq!(close.side, OrderSide::Buy);
        assert!(close.reduce_only);
    }

    #[test]
    fn test_validate() {
        assert_eq!(OrderRequest::open("ETHUSDT", Side::Short, 1.0, 3.0).validate(), None);
        assert_eq!(
            OrderRequest::open("", Side::Short, 1.0, 3.0).validate(),
            Some("symbol must be a non-empty string")
        );
        assert_eq!(
            OrderRequest::open("ETHUSDT", Side::Short, 0.0, 3.0).validate(),
            Some("quantity must be positive")
        );
        assert_eq!(
            OrderRequest::open("ETHUSDT", Side::Short, 1.0, -1.0).validate(),
            Some("leverage must be positive")
        );
    }
}
