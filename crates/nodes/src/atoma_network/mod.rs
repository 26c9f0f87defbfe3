//! Atoma Network node — chat completions against the hosted Atoma API.
//!
//! Two operations:
//! - `getModels` (load-options): `GET {baseURL}/v1/models`, one option per
//!   model id. Populates the `model` field.
//! - `execute`: `POST {baseURL}/v1/chat/completions` with
//!   `{ messages, model, stream: false }` for every input item; the response
//!   body becomes the output item unchanged.
//!
//! All requests go through the host's authenticated HTTP helper using the
//! [`AtomaNetworkApi`](crate::credentials::AtomaNetworkApi) credential.

pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::credentials::atoma_network_api::{BASE_URL_FIELD, CREDENTIAL_NAME};
use crate::description::{
    ConnectionType, CredentialRequirement, NodeProperty, NodeTypeDescription, PropertyOption,
    PropertyType,
};
use crate::http::{join_url, HttpRequestOptions};
use crate::item::{NodeExecutionData, NodeOutput};
use crate::traits::{ExecuteContext, LoadOptionsContext, NodeType, RequestHelpers};
use crate::{NodeApiError, NodeError};

use self::types::{is_failure, ChatCompletionRequest, ModelList};

/// Registry key of this node type.
pub const NODE_NAME: &str = "atomaNetworkNode";

/// Load-options method backing the `model` field.
pub const GET_MODELS: &str = "getModels";

pub const MODEL_PARAM: &str = "model";
pub const MESSAGES_PARAM: &str = "messages";

/// Default for `messages`: every item emitted by the `input-trigger` node.
pub const MESSAGES_DEFAULT: &str = r#"{{ $("input-trigger").all().map(e => e.json) }}"#;

const MODELS_PATH: &str = "/v1/models";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub struct AtomaNetworkNode {
    description: NodeTypeDescription,
}

impl Default for AtomaNetworkNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomaNetworkNode {
    pub fn new() -> Self {
        Self {
            description: describe(),
        }
    }
}

fn describe() -> NodeTypeDescription {
    NodeTypeDescription {
        display_name: "Atoma Network".into(),
        name: NODE_NAME.into(),
        icon: Some("file:atomaNetworkIcon.svg".into()),
        group: vec!["transform".into()],
        version: 1,
        description: "Transform text input properties with Atoma Network AI Chat completions."
            .into(),
        default_name: "Atoma Network".into(),
        credentials: vec![CredentialRequirement {
            name: CREDENTIAL_NAME.into(),
            required: true,
        }],
        inputs: vec![ConnectionType::Main],
        outputs: vec![ConnectionType::Main],
        properties: vec![
            NodeProperty::new("Model Name or ID", MODEL_PARAM, PropertyType::Options)
                .required()
                .load_options_from(GET_MODELS)
                .with_description(
                    "Select an Atoma Network model. Choose from the list, or specify an ID \
                     using an expression.",
                ),
            NodeProperty::new("Content (JSON)", MESSAGES_PARAM, PropertyType::Json)
                .with_default(MESSAGES_DEFAULT)
                .with_description(
                    "Parse the input fields to create the 'messages' object for the Atoma \
                     Network chat completions call",
                )
                .always_open_edit_window(),
        ],
    }
}

#[async_trait]
impl NodeType for AtomaNetworkNode {
    fn description(&self) -> &NodeTypeDescription {
        &self.description
    }

    async fn load_options(
        &self,
        method: &str,
        ctx: &dyn LoadOptionsContext,
    ) -> Result<Vec<PropertyOption>, NodeError> {
        match method {
            GET_MODELS => get_models(ctx).await,
            other => Err(NodeError::UnknownMethod(other.to_owned())),
        }
    }

    async fn execute(&self, ctx: &dyn ExecuteContext) -> Result<NodeOutput, NodeError> {
        // A node run without upstream items still performs one call.
        let item_count = ctx.input_items().len().max(1);
        let mut items = Vec::with_capacity(item_count);

        for item_index in 0..item_count {
            match complete(ctx, item_index).await {
                Ok(body) => items.push(NodeExecutionData::new(body).paired_with(item_index)),
                Err(err) if ctx.continue_on_fail() => {
                    warn!(node = %ctx.node().name, item_index, error = %err, "continuing after failure");
                    items.push(NodeExecutionData::failed(item_index, err));
                }
                Err(err) => return Err(err.at_item(ctx.node(), item_index)),
            }
        }

        Ok(vec![items])
    }
}

// ---------------------------------------------------------------------------
// getModels
// ---------------------------------------------------------------------------

/// List model ids as options. Any failure surfaces as an API error.
pub async fn get_models<C>(ctx: &C) -> Result<Vec<PropertyOption>, NodeError>
where
    C: RequestHelpers + ?Sized,
{
    fetch_models(ctx)
        .await
        .map_err(|err| NodeApiError::from_error(ctx.node(), err).into())
}

async fn fetch_models<C>(ctx: &C) -> Result<Vec<PropertyOption>, NodeError>
where
    C: RequestHelpers + ?Sized,
{
    let credentials = ctx.get_credentials(CREDENTIAL_NAME, None).await?;
    let url = join_url(credentials.require_str(BASE_URL_FIELD)?, MODELS_PATH);

    let response = ctx
        .http_request_with_authentication(CREDENTIAL_NAME, HttpRequestOptions::get(url))
        .await?;

    if is_failure(&response) {
        return Err(NodeApiError::new(ctx.node(), response).into());
    }

    let models: ModelList = match serde_json::from_value(response.clone()) {
        Ok(models) => models,
        Err(e) => {
            let mut err = NodeApiError::new(ctx.node(), response);
            err.message = format!("unexpected model list response: {e}");
            return Err(err.into());
        }
    };

    Ok(models
        .data
        .into_iter()
        .map(|m| PropertyOption {
            name: m.id.clone(),
            value: Value::String(m.id.clone()),
            description: Some(m.id),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// One chat completion for the item at `item_index`.
async fn complete<C>(ctx: &C, item_index: usize) -> Result<Value, NodeError>
where
    C: ExecuteContext + ?Sized,
{
    let credentials = ctx.get_credentials(CREDENTIAL_NAME, Some(item_index)).await?;
    let url = join_url(credentials.require_str(BASE_URL_FIELD)?, COMPLETIONS_PATH);

    let messages = parse_messages(ctx.get_node_parameter(
        MESSAGES_PARAM,
        item_index,
        Value::Array(Vec::new()),
    )?)?;
    let model = read_model(ctx.get_node_parameter(
        MODEL_PARAM,
        item_index,
        Value::String(String::new()),
    )?)?;

    let body = serde_json::to_value(ChatCompletionRequest::new(model, messages))
        .map_err(|e| NodeError::invalid_parameter(MESSAGES_PARAM, e.to_string()))?;

    let response = ctx
        .http_request_with_authentication(CREDENTIAL_NAME, HttpRequestOptions::post(url, body))
        .await?;

    info!(node = %ctx.node().name, item_index, response = %response, "AtomaNetworkNode::execute");

    if is_failure(&response) {
        return Err(NodeApiError::new(ctx.node(), response).into());
    }

    Ok(response)
}

/// `messages` is opaque JSON; text is parsed, anything else passes through.
fn parse_messages(value: Value) -> Result<Value, NodeError> {
    match value {
        Value::String(text) => serde_json::from_str(&text).map_err(|e| {
            NodeError::invalid_parameter(MESSAGES_PARAM, format!("not valid JSON: {e}"))
        }),
        other => Ok(other),
    }
}

fn read_model(value: Value) -> Result<String, NodeError> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Ok(id),
        Value::String(_) => Err(NodeError::invalid_parameter(
            MODEL_PARAM,
            "a model must be selected",
        )),
        other => Err(NodeError::invalid_parameter(
            MODEL_PARAM,
            format!("expected a model id, got {other}"),
        )),
    }
}
