//! `ManualTrigger` — entry node that emits the items a run was started with.

use async_trait::async_trait;

use crate::description::{ConnectionType, NodeTypeDescription};
use crate::item::NodeOutput;
use crate::traits::{ExecuteContext, NodeType};
use crate::NodeError;

pub const NODE_NAME: &str = "manualTrigger";

pub struct ManualTrigger {
    description: NodeTypeDescription,
}

impl Default for ManualTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self {
            description: NodeTypeDescription {
                display_name: "Manual Trigger".into(),
                name: NODE_NAME.into(),
                icon: None,
                group: vec!["trigger".into()],
                version: 1,
                description: "Starts the workflow with the items supplied by the caller.".into(),
                default_name: "input-trigger".into(),
                credentials: Vec::new(),
                inputs: Vec::new(),
                outputs: vec![ConnectionType::Main],
                properties: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl NodeType for ManualTrigger {
    fn description(&self) -> &NodeTypeDescription {
        &self.description
    }

    /// The host feeds the run's initial items in as input; pass them on.
    async fn execute(&self, ctx: &dyn ExecuteContext) -> Result<NodeOutput, NodeError> {
        let items = ctx
            .input_items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut item = item.clone();
                item.paired_item = Some(i);
                item
            })
            .collect();
        Ok(vec![items])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockContext;
    use crate::traits::NodeInfo;
    use serde_json::json;

    #[tokio::test]
    async fn passes_input_items_through() {
        let ctx = MockContext::new(NodeInfo::new("input-trigger", NODE_NAME))
            .with_items(vec![json!({ "role": "user" }), json!({ "role": "system" })]);

        let out = ManualTrigger::new().execute(&ctx).await.unwrap();

        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][1].json, json!({ "role": "system" }));
        assert_eq!(out[0][1].paired_item, Some(1));
        assert_eq!(ctx.request_count(), 0);
    }
}
