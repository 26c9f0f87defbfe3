//! `atoma-nodes` crate — node and credential contracts plus the built-in
//! implementations.
//!
//! Every node implements [`NodeType`] and every credential [`CredentialType`].
//! Hosts drive them through the context traits in [`traits`]; the engine
//! crate is one such host, [`mock::MockContext`] is another for tests.

pub mod atoma_network;
pub mod credential;
pub mod credentials;
pub mod description;
pub mod error;
pub mod http;
pub mod item;
pub mod mock;
pub mod traits;
pub mod trigger;

pub use atoma_network::AtomaNetworkNode;
pub use credential::{CredentialData, CredentialType};
pub use credentials::AtomaNetworkApi;
pub use description::{NodeProperty, NodeTypeDescription, PropertyOption};
pub use error::{ErrorContext, NodeApiError, NodeError, NodeOperationError};
pub use http::{HttpRequestOptions, Method};
pub use item::{NodeExecutionData, NodeOutput};
pub use traits::{ExecuteContext, LoadOptionsContext, NodeInfo, NodeType, RequestHelpers};
pub use trigger::ManualTrigger;
