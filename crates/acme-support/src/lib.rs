//! # acme-support
//!
//! ACME Inc. customer-service desk built from handoff-capable agents.
//!
//! ## Handoff graph
//!
//! ```text
//!                ┌──────────────────┐
//!         ┌─────▶│  Triage Agent    │◀─────┐
//!         │      └──┬────────────┬──┘      │
//!         │         │            │         │
//!         │         ▼            ▼         │
//!  ┌──────┴───────────┐    ┌───────────────┴──────────┐
//!  │   Sales Agent    │    │ Issues and Repairs Agent │
//!  │  execute_order   │    │ look_up_item             │
//!  └──────────────────┘    │ execute_refund           │
//!                          └──────────────────────────┘
//! ```
//!
//! Triage can also `escalate_to_human`, which ends the session. The refund
//! agent and sales assistant are standalone desks without transfers.

pub mod svckit;

use std::sync::Arc;

use agent_core::Agent;

use crate::svckit::{
    EscalateToHumanTool, ExecuteOrderTool, ExecuteRefundTool, LookUpItemTool, OrderConfirmation,
    PlaceOrderTool, TransferTool,
};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        EscalateToHumanTool, ExecuteOrderTool, ExecuteRefundTool, FixedConfirmation,
        LookUpItemTool, OrderConfirmation, PlaceOrderTool, TransferTool,
    };
}

/// Model used by every desk unless overridden
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const TRIAGE_INSTRUCTIONS: &str = "You are a customer service bot for ACME Inc. \
Introduce yourself. Always be very brief. \
Gather information to direct the customer to the right department. \
But make your questions subtle and natural.";

pub const SALES_INSTRUCTIONS: &str = "You are a sales agent for ACME Inc. \
Always answer in a sentence or less. \
Follow the following routine with the user:\
1. Ask them about any problems in their life related to catching roadrunners.\n\
2. Casually mention one of ACME's crazy made-up products can help.\n \
- Don't mention price.\n\
3. Once the user is bought in, drop a ridiculous price.\n\
4. Only after everything, and if the user says yes, \
tell them a crazy caveat and execute their order.\n";

pub const ISSUES_AND_REPAIRS_INSTRUCTIONS: &str = "You are a customer support agent for ACME Inc. \
Always answer in a sentence or less. \
Follow the following routine with the user:\
1. First, ask probing questions and understand the user's problem deeper.\n \
- unless the user has already provided a reason.\n\
2. Propose a fix (make one up).\n\
3. ONLY if not satisfied, offer a refund.\n\
4. If accepted, search for the ID and then execute refund.\n";

pub const REFUND_INSTRUCTIONS: &str = "You are a refund agent. Help the user with refunds.";

pub const SALES_ASSISTANT_INSTRUCTIONS: &str =
    "You are a sales assistant. Sell the user a product.";

/// Desks a conversation can start at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Desk {
    Triage,
    Sales,
    IssuesAndRepairs,
    Refund,
    SalesAssistant,
}

/// Builds the ACME agents and wires their handoffs
///
/// Cloning is cheap; transfer tools hold a clone and build their target on demand.
#[derive(Clone)]
pub struct SupportDesk {
    model: String,
    confirmation: Arc<dyn OrderConfirmation>,
}

impl SupportDesk {
    pub fn new(confirmation: Arc<dyn OrderConfirmation>) -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            confirmation,
        }
    }

    /// Use `model` for every agent
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn agent(&self, desk: Desk) -> Agent {
        match desk {
            Desk::Triage => self.triage(),
            Desk::Sales => self.sales(),
            Desk::IssuesAndRepairs => self.issues_and_repairs(),
            Desk::Refund => self.refund(),
            Desk::SalesAssistant => self.sales_assistant(),
        }
    }

    pub fn triage(&self) -> Agent {
        self.base("Triage Agent", TRIAGE_INSTRUCTIONS)
            .tool(self.transfer(
                "transfer_to_sales_agent",
                "Use for anything sales or buying related.",
                Desk::Sales,
            ))
            .tool(self.transfer(
                "transfer_to_issues_and_repairs",
                "Use for issues, repairs, or refunds.",
                Desk::IssuesAndRepairs,
            ))
            .tool(EscalateToHumanTool)
    }

    pub fn sales(&self) -> Agent {
        self.base("Sales Agent", SALES_INSTRUCTIONS)
            .tool(ExecuteOrderTool::new(Arc::clone(&self.confirmation)))
            .tool(self.transfer_back_to_triage())
    }

    pub fn issues_and_repairs(&self) -> Agent {
        self.base("Issues and Repairs Agent", ISSUES_AND_REPAIRS_INSTRUCTIONS)
            .tool(ExecuteRefundTool::by_item_id())
            .tool(LookUpItemTool)
            .tool(self.transfer_back_to_triage())
    }

    pub fn refund(&self) -> Agent {
        self.base("Refund Agent", REFUND_INSTRUCTIONS)
            .tool(ExecuteRefundTool::by_item_name())
    }

    pub fn sales_assistant(&self) -> Agent {
        self.base("Sales Assistant", SALES_ASSISTANT_INSTRUCTIONS)
            .tool(PlaceOrderTool)
    }

    fn base(&self, name: &str, instructions: &str) -> Agent {
        Agent::new(name)
            .model(&self.model)
            .instructions(instructions)
    }

    fn transfer_back_to_triage(&self) -> TransferTool {
        self.transfer(
            "transfer_back_to_triage",
            "Call this if the user brings up a topic outside of your purview,\n\
             including escalating to human.",
            Desk::Triage,
        )
    }

    fn transfer(&self, name: &str, doc: &str, target: Desk) -> TransferTool {
        let desk = self.clone();
        TransferTool::new(name, doc, move || desk.agent(target))
    }
}
