//! Node-level error types.
//!
//! Two error shapes matter to the host:
//! - [`NodeApiError`] — the remote API failed (transport error, non-2xx
//!   status, or an application-level `success: false` body).
//! - [`NodeOperationError`] — a failure raised while executing a node,
//!   correlated with the item it was processing.
//!
//! Both carry an [`ErrorContext`]. Errors that already have a context are
//! enriched in place by [`NodeError::at_item`]; everything else is wrapped in
//! a fresh `NodeOperationError`.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::traits::NodeInfo;

/// Fallback message when an API payload carries nothing readable.
const UNKNOWN_API_ERROR: &str = "The service was not able to process the request";

// ---------------------------------------------------------------------------
// ErrorContext
// ---------------------------------------------------------------------------

/// Correlation data attached to an error as it travels back to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    /// Index of the workflow item being processed when the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
    /// Free-form extra data.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// NodeApiError
// ---------------------------------------------------------------------------

/// The remote service rejected a request or could not be reached.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NodeApiError {
    /// Name of the node that issued the request.
    pub node: String,
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub http_code: Option<u16>,
    /// The original response body or error payload, untouched.
    pub payload: Value,
    pub context: ErrorContext,
}

impl NodeApiError {
    /// Wrap a response/error payload.
    pub fn new(node: &NodeInfo, payload: Value) -> Self {
        Self {
            node: node.name.clone(),
            message: message_from_payload(&payload),
            http_code: None,
            payload,
            context: ErrorContext::default(),
        }
    }

    pub fn with_http_code(mut self, code: u16) -> Self {
        self.http_code = Some(code);
        self
    }

    /// Turn any node error into an API error.
    ///
    /// API errors pass through unchanged; other errors become the payload of
    /// a new one.
    pub fn from_error(node: &NodeInfo, error: NodeError) -> Self {
        match error {
            NodeError::Api(api) => api,
            other => Self::new(node, other.to_json()),
        }
    }
}

/// Pick a human-readable message out of an API payload.
fn message_from_payload(payload: &Value) -> String {
    let candidates = [
        payload.get("message"),
        payload.pointer("/error/message"),
        payload.get("error"),
        payload.get("detail"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_owned))
        .or_else(|| payload.as_str().map(str::to_owned))
        .unwrap_or_else(|| UNKNOWN_API_ERROR.to_owned())
}

// ---------------------------------------------------------------------------
// NodeOperationError
// ---------------------------------------------------------------------------

/// A failure raised by a node while processing a specific item.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NodeOperationError {
    pub node: String,
    pub message: String,
    /// The error that was wrapped.
    #[source]
    pub cause: Box<NodeError>,
    pub context: ErrorContext,
}

impl NodeOperationError {
    /// Wrap `cause`, recording the item it was raised for.
    pub fn wrap(node: &NodeInfo, cause: NodeError, item_index: usize) -> Self {
        Self {
            node: node.name.clone(),
            message: cause.to_string(),
            cause: Box::new(cause),
            context: ErrorContext {
                item_index: Some(item_index),
                ..ErrorContext::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// NodeError
// ---------------------------------------------------------------------------

/// Errors returned by node operations and the host helpers they call.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    #[error(transparent)]
    Api(#[from] NodeApiError),

    #[error(transparent)]
    Operation(#[from] NodeOperationError),

    /// The node asked for a credential type the host has no instance of.
    #[error("no credentials of type '{0}' are configured for this node")]
    MissingCredentials(String),

    /// A credential instance lacks a field the request needs.
    #[error("credential field '{0}' is missing")]
    MissingCredentialField(String),

    /// A parameter value could not be read or is not acceptable.
    #[error("invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The host asked for a load-options method the node does not provide.
    #[error("unknown load-options method '{0}'")]
    UnknownMethod(String),
}

impl NodeError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The context object, for the error kinds that have one.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Api(e) => Some(&e.context),
            Self::Operation(e) => Some(&e.context),
            _ => None,
        }
    }

    pub fn context_mut(&mut self) -> Option<&mut ErrorContext> {
        match self {
            Self::Api(e) => Some(&mut e.context),
            Self::Operation(e) => Some(&mut e.context),
            _ => None,
        }
    }

    /// Correlate this error with the item at `item_index`.
    ///
    /// Errors with a context only get `itemIndex` set; the error itself is
    /// returned unchanged. Errors without one are wrapped in a new
    /// [`NodeOperationError`].
    pub fn at_item(mut self, node: &NodeInfo, item_index: usize) -> Self {
        if let Some(ctx) = self.context_mut() {
            ctx.item_index = Some(item_index);
            return self;
        }
        NodeOperationError::wrap(node, self, item_index).into()
    }

    /// JSON rendering used when the error is attached to an output item.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Api(e) => json!({
                "name": "NodeApiError",
                "node": e.node,
                "message": e.message,
                "httpCode": e.http_code,
                "payload": e.payload,
                "context": e.context,
            }),
            Self::Operation(e) => json!({
                "name": "NodeOperationError",
                "node": e.node,
                "message": e.message,
                "cause": e.cause.to_json(),
                "context": e.context,
            }),
            other => json!({
                "name": "Error",
                "message": other.to_string(),
            }),
        }
    }
}
