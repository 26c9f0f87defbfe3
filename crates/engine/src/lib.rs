//! `atoma-engine` crate — a host runtime for `atoma-nodes`.
//!
//! Provides the registry, credential store, authenticated HTTP helper and
//! parameter expressions nodes rely on, plus DAG validation and the workflow
//! executor that drives nodes over items.

pub mod config;
pub mod context;
pub mod credential_store;
pub mod dag;
pub mod error;
pub mod executor;
pub mod expression;
pub mod http;
pub mod models;
pub mod registry;

pub use config::ExecutorConfig;
pub use credential_store::{CredentialStore, StoredCredential};
pub use dag::validate_dag;
pub use error::EngineError;
pub use executor::{ExecutionResult, WorkflowExecutor};
pub use http::CredentialTestResult;
pub use models::{Edge, NodeDefinition, Workflow};
pub use registry::Registry;
