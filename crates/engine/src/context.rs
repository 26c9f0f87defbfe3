//! `HostContext` — the engine's implementation of the node context traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atoma_nodes::{
    CredentialData, CredentialType, ExecuteContext, HttpRequestOptions, LoadOptionsContext,
    NodeError, NodeExecutionData, NodeInfo, NodeTypeDescription, RequestHelpers,
};
use serde_json::Value;

use crate::credential_store::CredentialStore;
use crate::expression::{self, Scope};
use crate::http::HttpClient;
use crate::models::NodeDefinition;
use crate::registry::Registry;

/// Everything one node sees while it runs.
pub struct HostContext<'a> {
    pub(crate) node: NodeInfo,
    pub(crate) definition: &'a NodeDefinition,
    pub(crate) description: &'a NodeTypeDescription,
    pub(crate) registry: &'a Registry,
    pub(crate) credentials: &'a CredentialStore,
    pub(crate) http: &'a HttpClient,
    pub(crate) input: Vec<NodeExecutionData>,
    pub(crate) outputs: &'a HashMap<String, Vec<NodeExecutionData>>,
}

impl<'a> HostContext<'a> {
    /// The credential type definition and resolved data bound to this node.
    fn credential(
        &self,
        credential_type: &str,
    ) -> Result<(&'a Arc<dyn CredentialType>, CredentialData), NodeError> {
        let declared = self
            .description
            .credentials
            .iter()
            .any(|c| c.name == credential_type);
        if !declared {
            return Err(NodeError::MissingCredentials(credential_type.to_owned()));
        }

        let definition = self
            .registry
            .credential(credential_type)
            .map_err(|_| NodeError::MissingCredentials(credential_type.to_owned()))?;
        let instance = self
            .definition
            .credentials
            .get(credential_type)
            .map(String::as_str);
        let data = self.credentials.resolve(definition.as_ref(), instance)?;

        Ok((definition, data))
    }
}

#[async_trait]
impl<'a> RequestHelpers for HostContext<'a> {
    fn node(&self) -> &NodeInfo {
        &self.node
    }

    async fn get_credentials(
        &self,
        credential_type: &str,
        _item_index: Option<usize>,
    ) -> Result<CredentialData, NodeError> {
        self.credential(credential_type).map(|(_, data)| data)
    }

    async fn http_request_with_authentication(
        &self,
        credential_type: &str,
        request: HttpRequestOptions,
    ) -> Result<Value, NodeError> {
        let (definition, data) = self.credential(credential_type)?;
        self.http
            .send_authenticated(&self.node, definition.as_ref(), &data, request)
            .await
    }
}

impl<'a> LoadOptionsContext for HostContext<'a> {}

impl<'a> ExecuteContext for HostContext<'a> {
    fn input_items(&self) -> &[NodeExecutionData] {
        &self.input
    }

    fn get_node_parameter(
        &self,
        name: &str,
        item_index: usize,
        fallback: Value,
    ) -> Result<Value, NodeError> {
        let raw = self
            .definition
            .parameters
            .get(name)
            .or_else(|| self.description.property(name).map(|p| &p.default));

        let Some(raw) = raw else {
            return Ok(fallback);
        };

        let scope = Scope {
            outputs: self.outputs,
            input: &self.input,
            item_index,
        };
        expression::resolve(raw, &scope)
            .map_err(|e| NodeError::invalid_parameter(name, e.to_string()))
    }

    fn continue_on_fail(&self) -> bool {
        self.definition.continue_on_fail
    }
}
