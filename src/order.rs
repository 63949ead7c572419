//! The one tool the assistant can call: placing an order.
//!
//! Orders are fulfilled entirely locally. The "order number" is a cosmetic
//! random identifier with no uniqueness guarantee.

use rand::Rng;

use crate::gemini::{FunctionDeclaration, ToolInvocationRequest, ToolInvocationResult};

pub const PLACE_ORDER_TOOL: &str = "placeOrder";

/// Schema declared to the model at session start.
pub fn place_order_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: PLACE_ORDER_TOOL.to_string(),
        description: "Place an order for a list of menu items the customer asked for.".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Names of the menu items to order."
                }
            },
            "required": ["items"]
        }),
    }
}

/// Source of pseudo order numbers, injectable so tests can pin the value.
pub trait OrderNumberSource: Send {
    /// A number in `0..=9999`.
    fn next_order_number(&mut self) -> u32;
}

/// Default source backed by the thread-local RNG.
pub struct RandomOrderNumbers;

impl OrderNumberSource for RandomOrderNumbers {
    fn next_order_number(&mut self) -> u32 {
        rand::thread_rng().gen_range(0..10_000)
    }
}

/// Executes `placeOrder` invocations and phrases the confirmation.
pub struct OrderDesk {
    numbers: Box<dyn OrderNumberSource>,
}

impl Default for OrderDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderDesk {
    pub fn new() -> Self {
        Self::with_number_source(Box::new(RandomOrderNumbers))
    }

    pub fn with_number_source(numbers: Box<dyn OrderNumberSource>) -> Self {
        Self { numbers }
    }

    /// Runs one invocation and packages the outcome, tagged with the
    /// invocation's correlation id unchanged. The service enforces the
    /// declared `required` list, but a missing or empty `items` argument is
    /// still handled here as a failure outcome rather than an error, as is an
    /// unrecognized tool name.
    pub fn execute(&mut self, invocation: &ToolInvocationRequest) -> ToolInvocationResult {
        let outcome = if invocation.name != PLACE_ORDER_TOOL {
            tracing::warn!(tool = %invocation.name, "unrecognized tool invocation");
            format!("Unable to do that: `{}` is not a known action.", invocation.name)
        } else {
            let items: Vec<String> = invocation
                .arguments
                .get("items")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            if items.is_empty() {
                tracing::warn!("placeOrder invoked without any items");
                "No items were given, so no order was placed.".to_string()
            } else {
                let number = self.numbers.next_order_number();
                tracing::info!(order_number = number, ?items, "order placed");
                format!(
                    "Order #{} confirmed: {}. It will be ready shortly.",
                    number,
                    items.join(", ")
                )
            }
        };

        ToolInvocationResult {
            correlation_id: invocation.id.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNumbers(u32);

    impl OrderNumberSource for FixedNumbers {
        fn next_order_number(&mut self) -> u32 {
            self.0
        }
    }

    fn invocation(name: &str, arguments: serde_json::Value) -> ToolInvocationRequest {
        ToolInvocationRequest {
            id: "call-1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_confirmation_names_items_and_number() {
        let mut desk = OrderDesk::with_number_source(Box::new(FixedNumbers(4242)));
        let result = desk.execute(&invocation(
            PLACE_ORDER_TOOL,
            serde_json::json!({ "items": ["Pizza", "Coke"] }),
        ));
        assert_eq!(result.correlation_id, "call-1");
        assert!(result.outcome.contains("Pizza"));
        assert!(result.outcome.contains("Coke"));
        assert!(result.outcome.contains("#4242"));
    }

    #[test]
    fn test_missing_items_is_a_failure_outcome_not_an_error() {
        let mut desk = OrderDesk::with_number_source(Box::new(FixedNumbers(1)));
        let result = desk.execute(&invocation(PLACE_ORDER_TOOL, serde_json::json!({})));
        assert_eq!(result.correlation_id, "call-1");
        assert!(result.outcome.contains("no order was placed"));
    }

    #[test]
    fn test_empty_and_blank_items_are_rejected() {
        let mut desk = OrderDesk::with_number_source(Box::new(FixedNumbers(1)));
        let result = desk.execute(&invocation(
            PLACE_ORDER_TOOL,
            serde_json::json!({ "items": ["", "   "] }),
        ));
        assert!(result.outcome.contains("no order was placed"));
    }

    #[test]
    fn test_unknown_tool_names_are_refused() {
        let mut desk = OrderDesk::with_number_source(Box::new(FixedNumbers(1)));
        let result = desk.execute(&invocation("cancelOrder", serde_json::json!({})));
        assert!(result.outcome.contains("cancelOrder"));
        assert!(result.outcome.contains("not a known action"));
    }

    #[test]
    fn test_random_numbers_stay_in_range() {
        let mut source = RandomOrderNumbers;
        for _ in 0..100 {
            assert!(source.next_order_number() < 10_000);
        }
    }
}
