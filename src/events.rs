//! # events
//!
//! [`MonitorEvent`]: everything the runner pushes to WebSocket listeners.
//!
//! Events are serialised to JSON strings before hitting the
//! `broadcast::Sender<String>`, so receivers never need `Clone` on the
//! domain types.

use serde::Serialize;

use crate::engine::{EngineSnapshot, OrderOutcome};
use crate::models::{ClosedTrade, OrderAck, Position};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorEvent {
    /// Engine state after a tick. Also sent on WebSocket connect.
    Snapshot {
        snapshot: Box<EngineSnapshot>,
    },

    PositionOpened {
        position: Box<Position>,
        order_id: Option<String>,
    },

    PositionClosed {
        trade: Box<ClosedTrade>,
    },

    /// Venue refused an entry or a close.
    OrderRejected {
        stage: &'static str, // "ENTRY" | "EXIT"
        ack:   OrderAck,
    },

    TickFailed {
        error: String,
    },
}

impl MonitorEvent {
    /// The event an order outcome should announce.
    pub fn from_outcome(outcome: &OrderOutcome) -> Self {
        match outcome {
            OrderOutcome::Entered { position, ack } => MonitorEvent::PositionOpened {
                position: Box::new(position.clone()),
                order_id: ack.order_id.clone(),
            },
            OrderOutcome::EntryRejected { ack } => MonitorEvent::OrderRejected {
                stage: "ENTRY",
                ack:   ack.clone(),
            },
            OrderOutcome::Exited { trade, .. } => MonitorEvent::PositionClosed {
                trade: Box::new(trade.clone()),
            },
            OrderOutcome::ExitRejected { ack, .. } => MonitorEvent::OrderRejected {
                stage: "EXIT",
                ack:   ack.clone(),
            },
        }
    }

    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    #[test]
    fn test_event_tag_is_screaming_snake() {
        let event = MonitorEvent::TickFailed { error: "timeout".into() };
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["event"], "TICK_FAILED");
        assert_eq!(value["error"], "timeout");
    }

    #[test]
    fn test_rejected_exit_maps_to_exit_stage() {
        let outcome = OrderOutcome::ExitRejected {
            reason: crate::models::ExitReason::Sl,
            ack:    OrderAck::rejected("reduce-only would increase position", 5.0),
        };
        let value: serde_json::Value =
            serde_json::from_str(&MonitorEvent::from_outcome(&outcome).to_json()).unwrap();
        assert_eq!(value["event"], "ORDER_REJECTED");
        assert_eq!(value["stage"], "EXIT");
        assert_eq!(value["ack"]["success"], false);
    }

    #[test]
    fn test_entered_carries_position() {
        let position = Position {
            symbol:      "ETHUSDT".into(),
            side:        Side::Short,
            quantity:    1.0,
            entry_price: 3000.0,
            entry_ts:    300.0,
        };
        let outcome = OrderOutcome::Entered {
            position,
            ack: OrderAck::accepted("dry-1", "ok", 300.0),
        };
        let value: serde_json::Value =
            serde_json::from_str(&MonitorEvent::from_outcome(&outcome).to_json()).unwrap();
        assert_eq!(value["event"], "POSITION_OPENED");
        assert_eq!(value["order_id"], "dry-1");
        assert_eq!(value["position"]["entry_price"], 3000.0);
    }
}
