//! Refund Tool
//!
//! Two desks refund differently: the issues desk refunds a catalogue item ID
//! with an optional reason, the refund desk refunds by item name.

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolArgs, ToolOutput,
    tool::{Param, ToolSignature},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefundKey {
    ItemId,
    ItemName,
}

/// Tool for executing a refund
pub struct ExecuteRefundTool {
    key: RefundKey,
}

impl ExecuteRefundTool {
    /// `execute_refund(item_id, reason = "not provided")`
    pub const fn by_item_id() -> Self {
        Self {
            key: RefundKey::ItemId,
        }
    }

    /// `execute_refund(item_name)`
    pub const fn by_item_name() -> Self {
        Self {
            key: RefundKey::ItemName,
        }
    }
}

#[async_trait]
impl Tool for ExecuteRefundTool {
    fn signature(&self) -> ToolSignature {
        let signature = ToolSignature::new("execute_refund");
        match self.key {
            RefundKey::ItemId => signature
                .param(Param::new("item_id"))
                .param(Param::new("reason").with_default("not provided")),
            RefundKey::ItemName => signature.param(Param::new("item_name")),
        }
    }

    async fn call(&self, args: ToolArgs) -> CoreResult<ToolOutput> {
        match self.key {
            RefundKey::ItemId => {
                let item_id = args.string("item_id")?;
                let reason = args.string("reason")?;
                tracing::info!(item_id = %item_id, reason = %reason, "Refund executed");
            }
            RefundKey::ItemName => {
                let item_name = args.string("item_name")?;
                tracing::info!(item_name = %item_name, "Refund executed");
            }
        }
        Ok("success".into())
    }
}
