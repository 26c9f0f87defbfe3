//! `atoma-workflow` CLI entry-point.
//!
//! Available sub-commands:
//! - `models`           — list the models available to the configured key.
//! - `complete`         — run one chat completion and print the output items.
//! - `run`              — run a workflow JSON file.
//! - `validate`         — validate a workflow JSON file.
//! - `test-credentials` — check a credential against its health endpoint.
//! - `describe`         — print the node and credential descriptors.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use atoma_engine::{
    CredentialStore, CredentialTestResult, Edge, ExecutionResult, ExecutorConfig, NodeDefinition, Registry,
    StoredCredential, Workflow, WorkflowExecutor,
};
use atoma_nodes::atoma_network::{GET_MODELS, MESSAGES_PARAM, MODEL_PARAM, NODE_NAME};
use atoma_nodes::credentials::atoma_network_api::{
    API_KEY_FIELD, BASE_URL_FIELD, CREDENTIAL_NAME, DEFAULT_BASE_URL,
};
use atoma_nodes::NodeExecutionData;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Name given to the credential built from `--api-key` / `--base-url`.
const CLI_CREDENTIAL: &str = "atoma";

#[derive(Parser)]
#[command(
    name = "atoma-workflow",
    about = "Run Atoma Network chat completions as workflow nodes",
    version
)]
struct Cli {
    /// Atoma API key.
    #[arg(long, env = "ATOMA_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Atoma API base URL.
    #[arg(long, env = "ATOMA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// JSON file with additional credential instances
    /// (`[{ "name", "type", "data" }]`).
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ATOMA_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available model IDs.
    Models,
    /// Send one chat completion request.
    Complete {
        /// Model ID (see `models`).
        #[arg(long)]
        model: String,
        /// Messages JSON, or `@path` to read it from a file. Defaults to the
        /// input items.
        #[arg(long)]
        messages: Option<String>,
        /// JSON array of items fed to the `input-trigger` node.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Emit failures as error items instead of aborting.
        #[arg(long)]
        continue_on_fail: bool,
    },
    /// Run a workflow definition JSON file.
    Run {
        path: PathBuf,
        /// JSON array of items fed to the root nodes.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Call the credential's health endpoint.
    TestCredentials {
        /// Credential instance name.
        #[arg(long, default_value = CLI_CREDENTIAL)]
        name: String,
    },
    /// Print the node and credential descriptors as JSON.
    Describe,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Models => {
            let executor = executor(&cli)?;
            let options = executor
                .load_options(&atoma_node(&cli, Value::Null), GET_MODELS)
                .await?;
            for option in options {
                println!("{}", option.name);
            }
        }
        Command::Complete {
            model,
            messages,
            input,
            continue_on_fail,
        } => {
            let mut node = atoma_node(&cli, json!(model)).continuing_on_fail(*continue_on_fail);
            if let Some(messages) = messages {
                node = node.with_parameter(MESSAGES_PARAM, read_json_arg(messages)?);
            }
            let workflow = Workflow::new(
                "complete",
                vec![NodeDefinition::new("input-trigger", "manualTrigger"), node.clone()],
                vec![Edge::new("input-trigger", node.id.clone())],
            );
            let items = read_items(input.as_deref())?;

            let result = run_workflow(&cli, &workflow, items).await?;
            print_items(result.output())?;
        }
        Command::Run { path, input } => {
            let workflow = read_workflow(path)?;
            let items = read_items(input.as_deref())?;

            let result = run_workflow(&cli, &workflow, items).await?;
            info!("execution {} finished", result.execution_id);
            print_items(result.output())?;
        }
        Command::Validate { path } => {
            let workflow = read_workflow(path)?;
            match atoma_engine::validate_dag(&workflow) {
                Ok(order) => {
                    println!("Workflow is valid. Execution order: {order:?}");
                }
                Err(e) => {
                    eprintln!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::TestCredentials { name } => {
            match executor(&cli)?.test_credential(name).await? {
                CredentialTestResult::Ok { message } => println!("{message}"),
                CredentialTestResult::Error { message } => bail!("credential test failed: {message}"),
            }
        }
        Command::Describe => {
            let registry = Registry::with_builtins();
            let nodes: Vec<_> = registry
                .node_types()
                .into_iter()
                .map(|n| n.description().clone())
                .collect();
            let credentials: Vec<_> = registry
                .credential_types()
                .into_iter()
                .map(|c| {
                    json!({
                        "name": c.name(),
                        "displayName": c.display_name(),
                        "documentationUrl": c.documentation_url(),
                        "properties": c.properties(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "nodes": nodes, "credentials": credentials }))?
            );
        }
    }

    Ok(())
}

fn executor(cli: &Cli) -> Result<WorkflowExecutor> {
    let mut store = CredentialStore::new();

    if let Some(path) = &cli.credentials {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read credentials file {}", path.display()))?;
        let entries: Vec<StoredCredential> =
            serde_json::from_str(&text).context("invalid credentials file")?;
        for entry in entries {
            store.insert(entry);
        }
    }

    match &cli.api_key {
        Some(key) => {
            let mut data = Map::new();
            data.insert(API_KEY_FIELD.into(), json!(key));
            data.insert(BASE_URL_FIELD.into(), json!(cli.base_url));
            store.insert(StoredCredential {
                name: CLI_CREDENTIAL.into(),
                credential_type: CREDENTIAL_NAME.into(),
                data,
            });
        }
        None if store.is_empty() => warn!("no API key configured; requests will be rejected"),
        None => {}
    }

    let config = ExecutorConfig {
        request_timeout: std::time::Duration::from_secs(cli.timeout_secs),
        ..ExecutorConfig::default()
    };
    Ok(WorkflowExecutor::new(Registry::with_builtins(), store, config)?)
}

/// Run `workflow`, printing the structured node error to stderr on failure.
async fn run_workflow(cli: &Cli, workflow: &Workflow, items: Vec<Value>) -> Result<ExecutionResult> {
    match executor(cli)?.run(workflow, items).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if let Some(node_error) = e.node_error() {
                eprintln!("{}", serde_json::to_string_pretty(&node_error.to_json())?);
            }
            Err(e.into())
        }
    }
}

fn atoma_node(cli: &Cli, model: Value) -> NodeDefinition {
    let mut node = NodeDefinition::new("Atoma Network", NODE_NAME);
    if !model.is_null() {
        node = node.with_parameter(MODEL_PARAM, model);
    }
    if cli.api_key.is_some() {
        node = node.with_credential(CREDENTIAL_NAME, CLI_CREDENTIAL);
    }
    node
}

/// Inline JSON, or `@path` to read it from a file.
fn read_json_arg(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read file {path}"))?,
        None => arg.to_owned(),
    };
    serde_json::from_str(&text).context("invalid JSON")
}

fn read_items(path: Option<&Path>) -> Result<Vec<Value>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read input file {}", path.display()))?;
    match serde_json::from_str::<Value>(&text).context("invalid input JSON")? {
        Value::Array(items) => Ok(items),
        single @ Value::Object(_) => Ok(vec![single]),
        _ => bail!("input must be a JSON object or an array of objects"),
    }
}

fn read_workflow(path: &Path) -> Result<Workflow> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).context("invalid workflow JSON")
}

fn print_items(items: &[NodeExecutionData]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}
