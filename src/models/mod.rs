//! Domain models shared across the Dropshort engine and its collaborators.

pub mod order;
pub mod position;
pub mod tick;

pub use order::{OrderAck, OrderRequest, OrderSide};
pub use position::{ClosedTrade, ExitReason, ExitSignal, Position, Side};
pub use tick::{PriceTick, Timestamp};
