//! # exchange::gateway
//!
//! **Order Gateway Sink**: POSTs orders to a bridge service that holds the
//! venue credentials (e.g. a Hyperliquid signer).
//!
//! ## Gateway API Contract
//! `POST {base}/order/send`
//! ```json
//! { "symbol": "ETHUSDT", "side": "SELL", "quantity": 1.0, "leverage": 3.0,
//!   "limit_price": null, "reduce_only": false, "client_id": "dsh-1a2b3c4d" }
//! ```
//! Response:
//! ```json
//! { "success": true, "order_id": "0x…", "message": "accepted" }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::OrderSinkError;
use crate::exchange::OrderSink;
use crate::models::{OrderAck, OrderRequest};

/// Never wait on the gateway longer than this.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GatewayOrder<'a> {
    #[serde(flatten)]
    request: &'a OrderRequest,
    /// Fresh per `place_order` call, for correlating gateway logs. A retry on
    /// a later tick gets a new id, so this does not deduplicate orders.
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    success: bool,
    order_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ─── Sink ─────────────────────────────────────────────────────────────────────

pub struct GatewayOrderSink<C: Clock> {
    client: reqwest::Client,
    base_url: String,
    clock: C,
}

impl<C: Clock> GatewayOrderSink<C> {
    pub fn new(client: reqwest::Client, base_url: &str, clock: C) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }
}

fn client_id() -> String {
    format!("dsh-{}", &Uuid::new_v4().simple().to_string()[..8])
}

fn into_ack(resp: GatewayResponse, timestamp: f64) -> OrderAck {
    let message = resp.message.unwrap_or_else(|| {
        if resp.success { "accepted".to_string() } else { "rejected".to_string() }
    });
    OrderAck {
        success: resp.success,
        order_id: resp.order_id,
        message,
        timestamp,
    }
}

#[async_trait]
impl<C: Clock> OrderSink for GatewayOrderSink<C> {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderSinkError> {
        if let Some(reason) = request.validate() {
            warn!(reason, symbol = %request.symbol, "Order failed local validation");
            return Ok(OrderAck::rejected(reason, self.clock.now()));
        }

        let url = format!("{}/order/send", self.base_url);
        let payload = GatewayOrder { request, client_id: client_id() };

        info!(
            symbol      = %request.symbol,
            side        = request.side.as_str(),
            quantity    = request.quantity,
            leverage    = request.leverage,
            reduce_only = request.reduce_only,
            client_id   = %payload.client_id,
            url         = %url,
            "🚀 [GATEWAY] Sending order"
        );

        // ── HTTP POST ─────────────────────────────────────────────────────────
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Order gateway unreachable");
                OrderSinkError::Transport(e.to_string())
            })?;

        // ── HTTP Status ───────────────────────────────────────────────────────
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(http_status = %status, body = %body, "Order gateway returned HTTP error");
            return Err(OrderSinkError::Http { status: status.as_u16(), body });
        }

        // ── Parse Response ────────────────────────────────────────────────────
        let resp: GatewayResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Order gateway response parse failed");
            OrderSinkError::Malformed(e.to_string())
        })?;

        let ack = into_ack(resp, self.clock.now());
        if ack.success {
            info!(order_id = ?ack.order_id, "✅ [GATEWAY] Order accepted");
        } else {
            warn!(message = %ack.message, "❌ [GATEWAY] Order rejected");
        }
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::Side;

    #[test]
    fn test_payload_is_flat_json() {
        let request = OrderRequest::open("ETHUSDT", Side::Short, 1.0, 3.0);
        let payload = GatewayOrder { request: &request, client_id: "dsh-test".into() };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["symbol"], "ETHUSDT");
        assert_eq!(value["side"], "SELL");
        assert_eq!(value["reduce_only"], false);
        assert_eq!(value["client_id"], "dsh-test");
        assert!(value["limit_price"].is_null());
    }

    #[test]
    fn test_response_into_ack() {
        let resp: GatewayResponse =
            serde_json::from_str(r#"{"success":false,"order_id":null}"#).unwrap();
        let ack = into_ack(resp, 7.0);
        assert!(!ack.success);
        assert_eq!(ack.message, "rejected");
        assert_eq!(ack.timestamp, 7.0);
    }

    #[test]
    fn test_client_id_shape() {
        let id = client_id();
        assert!(id.starts_with("dsh-"));
        assert_eq!(id.len(), 12);
        assert_ne!(id, client_id());
    }

    #[tokio::test]
    async fn test_invalid_request_never_hits_network() {
        // Unroutable base URL: if we tried the network this would be an Err.
        let sink = GatewayOrderSink::new(reqwest::Client::new(), "http://127.0.0.1:9", ManualClock::new(3.0));
        let ack = sink
            .place_order(&OrderRequest::open("ETHUSDT", Side::Short, -1.0, 3.0))
            .await
            .unwrap();
        assert!(!ack.success);
        assert_eq!(ack.timestamp, 3.0);
    }
}
