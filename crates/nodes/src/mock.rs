//! `MockContext` — a fake host for exercising nodes without a runtime.
//!
//! Implements both [`LoadOptionsContext`] and [`ExecuteContext`]. HTTP
//! responses are queued up front and every request the node issues is
//! recorded so tests can assert on URLs and bodies.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::credential::CredentialData;
use crate::http::HttpRequestOptions;
use crate::item::NodeExecutionData;
use crate::traits::{ExecuteContext, LoadOptionsContext, NodeInfo, RequestHelpers};
use crate::{NodeApiError, NodeError};

/// Behaviour of the next authenticated HTTP call.
pub enum MockResponse {
    /// Return a specific JSON body.
    Json(Value),
    /// Fail with the given error.
    Fail(NodeError),
}

/// A request captured by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub credential_type: String,
    pub request: HttpRequestOptions,
}

pub struct MockContext {
    pub node: NodeInfo,
    pub credentials: Option<CredentialData>,
    pub parameters: HashMap<String, Value>,
    pub items: Vec<NodeExecutionData>,
    pub continue_on_fail: bool,
    responses: Mutex<VecDeque<MockResponse>>,
    /// All requests seen (in call order).
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockContext {
    pub fn new(node: NodeInfo) -> Self {
        Self {
            node,
            credentials: None,
            parameters: HashMap::new(),
            items: Vec::new(),
            continue_on_fail: false,
            responses: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_credentials(mut self, data: CredentialData) -> Self {
        self.credentials = Some(data);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        self.items = items.into_iter().map(NodeExecutionData::new).collect();
        self
    }

    pub fn continuing_on_fail(mut self) -> Self {
        self.continue_on_fail = true;
        self
    }

    /// Queue a successful response body.
    pub fn respond_with(self, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(MockResponse::Json(body));
        self
    }

    /// Queue a failing response.
    pub fn fail_with(self, error: NodeError) -> Self {
        self.responses.lock().unwrap().push_back(MockResponse::Fail(error));
        self
    }

    /// Number of HTTP requests issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestHelpers for MockContext {
    fn node(&self) -> &NodeInfo {
        &self.node
    }

    async fn get_credentials(
        &self,
        credential_type: &str,
        _item_index: Option<usize>,
    ) -> Result<CredentialData, NodeError> {
        self.credentials
            .clone()
            .ok_or_else(|| NodeError::MissingCredentials(credential_type.to_owned()))
    }

    async fn http_request_with_authentication(
        &self,
        credential_type: &str,
        request: HttpRequestOptions,
    ) -> Result<Value, NodeError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            credential_type: credential_type.to_owned(),
            request,
        });

        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Json(body)) => Ok(body),
            Some(MockResponse::Fail(err)) => Err(err),
            None => Err(NodeApiError::new(
                &self.node,
                json!({ "message": "no mock response queued" }),
            )
            .into()),
        }
    }
}

impl LoadOptionsContext for MockContext {}

impl ExecuteContext for MockContext {
    fn input_items(&self) -> &[NodeExecutionData] {
        &self.items
    }

    fn get_node_parameter(
        &self,
        name: &str,
        _item_index: usize,
        fallback: Value,
    ) -> Result<Value, NodeError> {
        Ok(self.parameters.get(name).cloned().unwrap_or(fallback))
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}
