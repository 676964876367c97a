//! Coffee barista taking drink orders

use std::sync::Arc;

use super::{AssistantKind, SlotAssistant, ToolDefinition, ToolNames};
use crate::config::BaristaConfig;
use crate::notify::Notifier;
use crate::session::Conversation;
use crate::slots::CoffeeOrder;
use crate::store::OrderFile;

/// Barista assistant over a [`CoffeeOrder`]
pub type BaristaAssistant = SlotAssistant<CoffeeOrder>;

const TOOLS: ToolNames = ToolNames {
    update: "update_order",
    complete: "finish_order",
};

const INSTRUCTIONS: &str = "\
You are a cheerful barista at MoonBrew Coffee. Introduce yourself, then take \
the customer's order one question at a time.

Rules:
1. Whenever the customer mentions any detail (drink, size, milk, extras, or \
their name), call update_order with just that detail.
2. Never keep order details in your own memory. The order only exists through \
update_order.
3. Ask one question at a time and keep replies short and friendly.
4. Once drink, size, milk, and name are known, call finish_order.
5. If finish_order reports missing fields, ask for them.
6. After a successful finish_order, thank the customer by name.

Order fields: drinkType, size, milk, extras, name.

Available extras: whipped cream, caramel, chocolate syrup, hazelnut syrup, \
vanilla syrup, ice.";

impl SlotAssistant<CoffeeOrder> {
    /// Create a barista with an empty order
    ///
    /// Completed orders go to `store`, orders left unfinished to `drafts`.
    #[must_use]
    pub fn new(
        config: &BaristaConfig,
        store: Arc<OrderFile>,
        drafts: Arc<OrderFile>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let conversation =
            Conversation::<CoffeeOrder>::new(config.gate, config.topic.clone(), store, notifier)
                .with_drafts(drafts);
        Self::from_parts(
            AssistantKind::Barista,
            INSTRUCTIONS.to_string(),
            TOOLS,
            tool_definitions(),
            "Order is not complete yet.",
            conversation,
        )
    }
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            TOOLS.update,
            "Record any order details the customer just gave. Pass only the fields that were mentioned; extras are added to the existing list.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "drinkType": {
                        "type": "string",
                        "description": "Drink, e.g. latte or cappuccino"
                    },
                    "size": {
                        "type": "string",
                        "description": "Cup size, e.g. small, medium, large"
                    },
                    "milk": {
                        "type": "string",
                        "description": "Milk choice, e.g. whole, oat, none"
                    },
                    "extras": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Extras to add to the order"
                    },
                    "name": {
                        "type": "string",
                        "description": "Customer name for the cup"
                    }
                },
                "additionalProperties": false
            }),
        ),
        ToolDefinition::function(
            TOOLS.complete,
            "Save the order and send it to the counter once drink, size, milk, and name are known.",
            serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        ),
    ]
}
