//! Service Kit - Agent Tools
//!
//! Customer-service tools that implement `agent_core::Tool` for the ACME desk.

mod escalate;
mod lookup;
mod order;
mod refund;
mod transfer;

pub use escalate::EscalateToHumanTool;
pub use lookup::LookUpItemTool;
pub use order::{ExecuteOrderTool, FixedConfirmation, OrderConfirmation, PlaceOrderTool};
pub use refund::ExecuteRefundTool;
pub use transfer::TransferTool;
