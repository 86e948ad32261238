//! # engine
//!
//! ```text
//! PriceSource ──▶ PriceHistory ──▶ DrawdownDetector ──▶ EntryGate ──▶ OrderSink (SELL)
//!                      │                                                   │
//!                      └──────────▶ PositionTracker ◀──────────────────────┘
//!                                        │ SL / TP
//!                                        ▼
//!                                  OrderSink (BUY, reduce-only) ──▶ TradeLogger
//! ```

pub mod drawdown;
pub mod gate;
pub mod history;
pub mod strategy;
pub mod tracker;

pub use strategy::{EngineSnapshot, OrderOutcome, StrategyEngine};
