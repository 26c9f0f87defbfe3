//! Workflow definitions as the engine reads them.
//!
//! A workflow file is JSON:
//!
//! ```json
//! {
//!   "name": "chat",
//!   "nodes": [
//!     { "id": "input-trigger", "nodeType": "manualTrigger" },
//!     { "id": "Atoma Network", "nodeType": "atomaNetworkNode",
//!       "parameters": { "model": "meta-llama/Llama-3.3-70B-Instruct" },
//!       "credentials": { "atomaNetworkApi": "atoma" } }
//!   ],
//!   "edges": [{ "from": "input-trigger", "to": "Atoma Network" }]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// NodeDefinition
// ---------------------------------------------------------------------------

/// A single node instance in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    /// Unique name within this workflow (referenced by edges and `$("…")`).
    pub id: String,
    /// Maps to a registered `NodeType`.
    pub node_type: String,
    /// Parameter values; missing ones fall back to the declared defaults.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Credential type name → credential instance name.
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    /// Turn per-item failures into error-tagged output items.
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl NodeDefinition {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parameters: Map::new(),
            credentials: HashMap::new(),
            continue_on_fail: false,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_credential(
        mut self,
        credential_type: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        self.credentials.insert(credential_type.into(), instance.into());
        self
    }

    pub fn continuing_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed edge from one node to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A complete workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, nodes: Vec<NodeDefinition>, edges: Vec<Edge>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            nodes,
            edges,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// IDs of the nodes with an edge into `id`, in edge order.
    pub fn parents<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to == id)
            .map(|e| e.from.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_json_uses_camel_case_and_defaults() {
        let wf: Workflow = serde_json::from_value(json!({
            "name": "chat",
            "nodes": [
                { "id": "input-trigger", "nodeType": "manualTrigger" },
                { "id": "llm", "nodeType": "atomaNetworkNode", "continueOnFail": true,
                  "parameters": { "model": "m1" },
                  "credentials": { "atomaNetworkApi": "default" } }
            ],
            "edges": [{ "from": "input-trigger", "to": "llm" }]
        }))
        .unwrap();

        let llm = wf.node("llm").unwrap();
        assert!(llm.continue_on_fail);
        assert_eq!(llm.parameters["model"], "m1");
        assert_eq!(llm.credentials["atomaNetworkApi"], "default");
        assert!(!wf.node("input-trigger").unwrap().continue_on_fail);
        assert_eq!(wf.parents("llm").collect::<Vec<_>>(), vec!["input-trigger"]);
    }
}
