//! Order Tools
//!
//! `place_order` records an order outright; `execute_order` asks the
//! customer to confirm the price first.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolArgs, ToolOutput,
    tool::{Param, ToolSignature},
};

/// Asks the customer whether an order should go through
#[async_trait]
pub trait OrderConfirmation: Send + Sync {
    async fn confirm(&self, product: &str, price: i64) -> CoreResult<bool>;
}

/// Always answers the same way (non-interactive runs and tests)
#[derive(Clone, Copy, Debug)]
pub struct FixedConfirmation(pub bool);

#[async_trait]
impl OrderConfirmation for FixedConfirmation {
    async fn confirm(&self, _product: &str, _price: i64) -> CoreResult<bool> {
        Ok(self.0)
    }
}

/// Tool for placing an order by item name
pub struct PlaceOrderTool;

#[async_trait]
impl Tool for PlaceOrderTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new("place_order").param(Param::new("item_name"))
    }

    async fn call(&self, args: ToolArgs) -> CoreResult<ToolOutput> {
        let item_name = args.string("item_name")?;
        tracing::info!(item = %item_name, "Order placed");
        Ok("success".into())
    }
}

/// Tool for executing a priced order after customer confirmation
pub struct ExecuteOrderTool {
    confirmation: Arc<dyn OrderConfirmation>,
}

impl ExecuteOrderTool {
    pub fn new(confirmation: Arc<dyn OrderConfirmation>) -> Self {
        Self { confirmation }
    }
}

#[async_trait]
impl Tool for ExecuteOrderTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new("execute_order")
            .doc("Price should be in USD.")
            .param(Param::new("product"))
            .param(Param::typed::<i64>("price"))
    }

    async fn call(&self, args: ToolArgs) -> CoreResult<ToolOutput> {
        let product = args.string("product")?;
        let price = args.integer("price")?;

        if self.confirmation.confirm(&product, price).await? {
            tracing::info!(product = %product, price, "Order executed");
            Ok("Success".into())
        } else {
            tracing::info!(product = %product, price, "Order cancelled");
            Ok("User cancelled order.".into())
        }
    }
}
