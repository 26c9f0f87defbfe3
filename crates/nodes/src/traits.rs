//! The `NodeType` trait and the host contexts handed to it.
//!
//! Everything a node needs from its host (credential resolution, the
//! authenticated HTTP helper, parameters, the continue-on-fail flag) comes
//! through these context traits. Nodes never construct them; the host does,
//! and tests substitute [`crate::mock::MockContext`].

use async_trait::async_trait;
use serde_json::Value;

use crate::credential::CredentialData;
use crate::description::{NodeTypeDescription, PropertyOption};
use crate::http::HttpRequestOptions;
use crate::item::{NodeExecutionData, NodeOutput};
use crate::NodeError;

/// Identity of the node instance being run, used when building errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Instance name within the workflow.
    pub name: String,
    pub node_type: String,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Host contexts
// ---------------------------------------------------------------------------

/// Helpers available both while loading options and while executing.
#[async_trait]
pub trait RequestHelpers: Send + Sync {
    fn node(&self) -> &NodeInfo;

    /// Credential instance of `credential_type` bound to this node.
    async fn get_credentials(
        &self,
        credential_type: &str,
        item_index: Option<usize>,
    ) -> Result<CredentialData, NodeError>;

    /// Send `request` after applying `credential_type`'s authentication and
    /// return the decoded JSON body. Failures come back as API errors.
    async fn http_request_with_authentication(
        &self,
        credential_type: &str,
        request: HttpRequestOptions,
    ) -> Result<Value, NodeError>;
}

/// Context for load-options methods (field population at configuration time).
pub trait LoadOptionsContext: RequestHelpers {}

/// Context for [`NodeType::execute`].
pub trait ExecuteContext: RequestHelpers {
    /// Items on the node's first input.
    fn input_items(&self) -> &[NodeExecutionData];

    /// Resolved value of parameter `name` for the item at `item_index`;
    /// `fallback` when neither a value nor a declared default exists.
    fn get_node_parameter(
        &self,
        name: &str,
        item_index: usize,
        fallback: Value,
    ) -> Result<Value, NodeError>;

    /// Whether failures should become error-tagged output items.
    fn continue_on_fail(&self) -> bool;
}

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// The core node trait.
///
/// All built-in nodes and plugin nodes implement this.
#[async_trait]
pub trait NodeType: Send + Sync {
    fn description(&self) -> &NodeTypeDescription;

    /// Run the load-options method `method` (the name referenced by a
    /// property's `loadOptionsMethod`).
    async fn load_options(
        &self,
        method: &str,
        _ctx: &dyn LoadOptionsContext,
    ) -> Result<Vec<PropertyOption>, NodeError> {
        Err(NodeError::UnknownMethod(method.to_owned()))
    }

    /// Process the input items and return this node's outputs.
    async fn execute(&self, ctx: &dyn ExecuteContext) -> Result<NodeOutput, NodeError>;
}
