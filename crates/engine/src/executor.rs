//! Workflow execution engine.
//!
//! `WorkflowExecutor` is the host side of the node contract:
//! 1. Validates the DAG and produces a topological ordering.
//! 2. Runs each node once, handing it a [`HostContext`] with its input items.
//! 3. Root nodes receive the run's initial items; other nodes receive the
//!    concatenated first-output items of their parents.
//! 4. Keeps every node's output so later parameters can reference it.
//! 5. Aborts on the first node error. Per-item recovery is the node's job
//!    (continue-on-fail).
//!
//! It also serves the configuration-time calls: load-options methods and
//! credential tests.

use std::collections::HashMap;

use atoma_nodes::{
    CredentialData, NodeExecutionData, NodeInfo, NodeTypeDescription, PropertyOption,
};
use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::context::HostContext;
use crate::credential_store::CredentialStore;
use crate::dag::validate_dag;
use crate::http::{CredentialTestResult, HttpClient};
use crate::models::{NodeDefinition, Workflow};
use crate::registry::Registry;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Output of a completed execution
// ---------------------------------------------------------------------------

/// The result of running a full workflow.
#[derive(Debug)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    /// Node IDs in the order they ran.
    pub order: Vec<String>,
    /// First-output items of every node, keyed by node ID.
    pub outputs: HashMap<String, Vec<NodeExecutionData>>,
}

impl ExecutionResult {
    /// Items produced by the node that ran last.
    pub fn output(&self) -> &[NodeExecutionData] {
        self.order
            .last()
            .and_then(|id| self.outputs.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// WorkflowExecutor
// ---------------------------------------------------------------------------

/// Runs workflows against a fixed registry and credential store.
pub struct WorkflowExecutor {
    registry: Registry,
    credentials: CredentialStore,
    http: HttpClient,
}

impl WorkflowExecutor {
    /// Create a new executor.
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be built.
    pub fn new(
        registry: Registry,
        credentials: CredentialStore,
        config: ExecutorConfig,
    ) -> Result<Self, EngineError> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            registry,
            credentials,
            http,
        })
    }

    /// Run the workflow with `initial_items` fed to its root nodes.
    ///
    /// # Errors
    /// Returns `EngineError` for validation failures, unknown node types, or
    /// the first node that fails.
    #[instrument(skip(self, workflow, initial_items), fields(workflow_id = %workflow.id, workflow = %workflow.name))]
    pub async fn run(
        &self,
        workflow: &Workflow,
        initial_items: Vec<Value>,
    ) -> Result<ExecutionResult, EngineError> {
        let order = validate_dag(workflow)?;
        let execution_id = Uuid::new_v4();
        info!(%execution_id, "executing {} nodes in order: {:?}", order.len(), order);

        let initial: Vec<NodeExecutionData> =
            initial_items.into_iter().map(NodeExecutionData::new).collect();
        let mut outputs: HashMap<String, Vec<NodeExecutionData>> = HashMap::new();

        for node_id in &order {
            // validate_dag returned this ID, so the node exists.
            let Some(definition) = workflow.node(node_id) else {
                continue;
            };
            let node = self.registry.node(&definition.node_type)?;

            let input = gather_input(workflow, node_id, &initial, &outputs);
            let result = {
                let ctx = self.context(definition, node.description(), input, &outputs);
                node.execute(&ctx).await
            };

            match result {
                Ok(output) => {
                    let items = output.into_iter().next().unwrap_or_default();
                    info!("node '{}' produced {} item(s)", node_id, items.len());
                    outputs.insert(node_id.clone(), items);
                }
                Err(source) => {
                    error!("node '{}' failed: {}", node_id, source);
                    return Err(EngineError::Node {
                        node_id: node_id.clone(),
                        source,
                    });
                }
            }
        }

        info!("workflow '{}' execution {} succeeded", workflow.name, execution_id);

        Ok(ExecutionResult {
            execution_id,
            order,
            outputs,
        })
    }

    /// Call load-options method `method` of `definition`'s node type.
    #[instrument(skip(self, definition), fields(node = %definition.id))]
    pub async fn load_options(
        &self,
        definition: &NodeDefinition,
        method: &str,
    ) -> Result<Vec<PropertyOption>, EngineError> {
        let node = self.registry.node(&definition.node_type)?;
        let outputs = HashMap::new();
        let ctx = self.context(definition, node.description(), Vec::new(), &outputs);

        node.load_options(method, &ctx)
            .await
            .map_err(|source| EngineError::Node {
                node_id: definition.id.clone(),
                source,
            })
    }

    /// Run the test request of the stored credential `instance`.
    #[instrument(skip(self))]
    pub async fn test_credential(&self, instance: &str) -> Result<CredentialTestResult, EngineError> {
        let stored = self
            .credentials
            .get(instance)
            .ok_or_else(|| EngineError::UnknownCredential(instance.to_owned()))?;
        let credential_type = self.registry.credential(&stored.credential_type)?;
        let data = CredentialData::from_properties(&credential_type.properties(), &stored.data);

        let node = NodeInfo::new(instance, credential_type.name());
        let result = self
            .http
            .test_credential(&node, credential_type.as_ref(), &data)
            .await?;
        info!(?result, "credential test finished");
        Ok(result)
    }

    fn context<'a>(
        &'a self,
        definition: &'a NodeDefinition,
        description: &'a NodeTypeDescription,
        input: Vec<NodeExecutionData>,
        outputs: &'a HashMap<String, Vec<NodeExecutionData>>,
    ) -> HostContext<'a> {
        HostContext {
            node: NodeInfo::new(definition.id.clone(), definition.node_type.clone()),
            definition,
            description,
            registry: &self.registry,
            credentials: &self.credentials,
            http: &self.http,
            input,
            outputs,
        }
    }
}

/// Items on `node_id`'s input: the initial items for roots, otherwise the
/// parents' outputs in edge order (each parent counted once).
fn gather_input(
    workflow: &Workflow,
    node_id: &str,
    initial: &[NodeExecutionData],
    outputs: &HashMap<String, Vec<NodeExecutionData>>,
) -> Vec<NodeExecutionData> {
    let mut parents: Vec<&str> = Vec::new();
    for parent in workflow.parents(node_id) {
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    if parents.is_empty() {
        return initial.to_vec();
    }

    parents
        .into_iter()
        .filter_map(|p| outputs.get(p))
        .flat_map(|items| items.iter().cloned())
        .map(|mut item| {
            item.paired_item = None;
            item.error = None;
            item
        })
        .collect()
}
