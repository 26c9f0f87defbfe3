//! Engine-level error types.

use atoma_nodes::NodeError;
use thiserror::Error;

/// Errors produced by the host runtime (validation + execution).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Validation errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the workflow.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// Topological sort detected a cycle.
    #[error("workflow graph contains a cycle")]
    CycleDetected,

    // ------ Registry / configuration errors ------

    #[error("no implementation registered for node type '{0}'")]
    UnknownNodeType(String),

    #[error("no credential type registered as '{0}'")]
    UnknownCredentialType(String),

    #[error("no credential instance named '{0}'")]
    UnknownCredential(String),

    #[error("credential type '{0}' has no test request")]
    CredentialNotTestable(String),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // ------ Execution errors ------

    /// A node failed; the whole execution is aborted.
    #[error("node '{node_id}' failed: {source}")]
    Node {
        node_id: String,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    /// The node error behind this failure, if any.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            Self::Node { source, .. } => Some(source),
            _ => None,
        }
    }
}
