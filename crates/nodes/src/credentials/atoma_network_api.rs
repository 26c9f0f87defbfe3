//! Credential for the hosted Atoma Network inference API.
//!
//! Fields: `apiKey` (secret) and `baseURL`. Requests are authenticated with a
//! bearer header; `GET {baseURL}/health` tests an instance.

use crate::credential::{AuthValue, Authentication, CredentialTestRequest, CredentialType};
use crate::description::{NodeProperty, PropertyType};
use crate::http::Method;

/// Registry key of this credential type.
pub const CREDENTIAL_NAME: &str = "atomaNetworkApi";

/// Production endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.atoma.network";

pub const API_KEY_FIELD: &str = "apiKey";
pub const BASE_URL_FIELD: &str = "baseURL";

#[derive(Debug, Default, Clone, Copy)]
pub struct AtomaNetworkApi;

impl CredentialType for AtomaNetworkApi {
    fn name(&self) -> &str {
        CREDENTIAL_NAME
    }

    fn display_name(&self) -> &str {
        "AtomaNetwork API"
    }

    fn documentation_url(&self) -> Option<&str> {
        Some("https://docs.atoma.network/cloud-api-reference/get-started")
    }

    fn properties(&self) -> Vec<NodeProperty> {
        vec![
            NodeProperty::new("API Key", API_KEY_FIELD, PropertyType::String).password(),
            NodeProperty::new("Base URL", BASE_URL_FIELD, PropertyType::String)
                .with_default(DEFAULT_BASE_URL),
        ]
    }

    fn authenticate(&self) -> Authentication {
        Authentication::default()
            .header("Authorization", AuthValue::field("Bearer ", API_KEY_FIELD))
            .header("Content-Type", AuthValue::Literal("application/json".into()))
    }

    fn test_request(&self) -> Option<CredentialTestRequest> {
        Some(CredentialTestRequest {
            method: Method::Get,
            base_url_field: BASE_URL_FIELD.into(),
            path: "/health".into(),
        })
    }
}
