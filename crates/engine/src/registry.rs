//! Node and credential type registry.

use std::collections::HashMap;
use std::sync::Arc;

use atoma_nodes::{AtomaNetworkApi, AtomaNetworkNode, CredentialType, ManualTrigger, NodeType};

use crate::EngineError;

/// Maps type names to their implementations.
#[derive(Default, Clone)]
pub struct Registry {
    nodes: HashMap<String, Arc<dyn NodeType>>,
    credentials: HashMap<String, Arc<dyn CredentialType>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every node and credential type shipped in `atoma-nodes`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_node(Arc::new(ManualTrigger::new()));
        registry.register_node(Arc::new(AtomaNetworkNode::new()));
        registry.register_credential(Arc::new(AtomaNetworkApi));
        registry
    }

    /// Register under the node's description name, replacing any previous one.
    pub fn register_node(&mut self, node: Arc<dyn NodeType>) {
        self.nodes.insert(node.description().name.clone(), node);
    }

    pub fn register_credential(&mut self, credential: Arc<dyn CredentialType>) {
        self.credentials.insert(credential.name().to_owned(), credential);
    }

    pub fn node(&self, node_type: &str) -> Result<&Arc<dyn NodeType>, EngineError> {
        self.nodes
            .get(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_owned()))
    }

    pub fn credential(&self, name: &str) -> Result<&Arc<dyn CredentialType>, EngineError> {
        self.credentials
            .get(name)
            .ok_or_else(|| EngineError::UnknownCredentialType(name.to_owned()))
    }

    /// All registered node types, sorted by name.
    pub fn node_types(&self) -> Vec<&Arc<dyn NodeType>> {
        let mut nodes: Vec<_> = self.nodes.values().collect();
        nodes.sort_by(|a, b| a.description().name.cmp(&b.description().name));
        nodes
    }

    /// All registered credential types, sorted by name.
    pub fn credential_types(&self) -> Vec<&Arc<dyn CredentialType>> {
        let mut creds: Vec<_> = self.credentials.values().collect();
        creds.sort_by(|a, b| a.name().cmp(b.name()));
        creds
    }
}
