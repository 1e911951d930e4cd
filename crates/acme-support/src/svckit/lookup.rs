//! Item Lookup Tool

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolArgs, ToolOutput,
    tool::{Param, ToolSignature},
};

/// Catalogue search; every query resolves to the same demo item
pub const DEMO_ITEM_ID: &str = "item_132612938";

/// Tool for finding an item ID from a description
pub struct LookUpItemTool;

#[async_trait]
impl Tool for LookUpItemTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new("look_up_item")
            .doc(
                "Use to find item ID.\n\
                 Search query can be a description or keywords.",
            )
            .param(Param::new("search_query"))
    }

    async fn call(&self, args: ToolArgs) -> CoreResult<ToolOutput> {
        let query = args.string("search_query")?;
        tracing::info!(query = %query, item_id = DEMO_ITEM_ID, "Found item");
        Ok(DEMO_ITEM_ID.into())
    }
}
