//! Workflow items — the unit of data flowing between nodes.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::NodeError;

/// One item in a node's input or output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionData {
    pub json: Value,
    /// Index of the input item this one was produced from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<usize>,
    /// Set when the node failed for this item and continued anyway.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<NodeError>,
}

impl NodeExecutionData {
    pub fn new(json: Value) -> Self {
        Self {
            json,
            paired_item: None,
            error: None,
        }
    }

    pub fn paired_with(mut self, item_index: usize) -> Self {
        self.paired_item = Some(item_index);
        self
    }

    /// An empty item carrying `error`, for continue-on-fail output.
    pub fn failed(item_index: usize, error: NodeError) -> Self {
        Self {
            json: Value::Object(Map::new()),
            paired_item: Some(item_index),
            error: Some(error),
        }
    }
}

fn serialize_error<S: Serializer>(error: &Option<NodeError>, s: S) -> Result<S::Ok, S::Error> {
    error.as_ref().map(NodeError::to_json).serialize(s)
}

/// Outputs of one node execution, one vector per output connection.
pub type NodeOutput = Vec<Vec<NodeExecutionData>>;
