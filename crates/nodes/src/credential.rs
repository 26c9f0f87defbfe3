//! The `CredentialType` trait and the data a host resolves for it.
//!
//! A credential type is pure declaration: its fields, how they are injected
//! into outgoing requests, and how to test them. The host owns storage and
//! performs all I/O.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::description::NodeProperty;
use crate::http::{join_url, Method};
use crate::NodeError;

// ---------------------------------------------------------------------------
// CredentialData
// ---------------------------------------------------------------------------

/// A single resolved credential field.
pub enum CredentialValue {
    Plain(String),
    /// Password-flagged field. Never printed by `Debug`.
    Secret(SecretString),
}

impl Clone for CredentialValue {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(s) => Self::Plain(s.clone()),
            Self::Secret(s) => Self::Secret(SecretString::from(s.expose_secret().to_owned())),
        }
    }
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.debug_tuple("Plain").field(s).finish(),
            Self::Secret(_) => f.write_str("Secret([REDACTED])"),
        }
    }
}

/// Field values of one credential instance, as handed to a node.
#[derive(Debug, Clone, Default)]
pub struct CredentialData {
    values: BTreeMap<String, CredentialValue>,
}

impl CredentialData {
    /// Resolve raw user input against a credential type's field list.
    ///
    /// Missing fields take the declared default; password fields become
    /// secrets. Keys not declared by the type are dropped.
    pub fn from_properties(properties: &[NodeProperty], raw: &Map<String, Value>) -> Self {
        let values = properties
            .iter()
            .map(|prop| {
                let text = match raw.get(&prop.name).unwrap_or(&prop.default) {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                let value = if prop.type_options.password {
                    CredentialValue::Secret(SecretString::from(text))
                } else {
                    CredentialValue::Plain(text)
                };
                (prop.name.clone(), value)
            })
            .collect();

        Self { values }
    }

    /// A non-secret field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            CredentialValue::Plain(s) => Some(s),
            CredentialValue::Secret(_) => None,
        }
    }

    /// Any field, secret or not. Callers must not log the result.
    pub fn expose(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            CredentialValue::Plain(s) => Some(s),
            CredentialValue::Secret(s) => Some(s.expose_secret()),
        }
    }

    /// A non-secret field that must be present.
    pub fn require_str(&self, key: &str) -> Result<&str, NodeError> {
        self.get_str(key)
            .ok_or_else(|| NodeError::MissingCredentialField(key.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Value of an injected header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValue {
    Literal(String),
    /// `prefix` followed by the credential field `field`.
    Field { prefix: String, field: String },
}

impl AuthValue {
    pub fn field(prefix: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Field {
            prefix: prefix.into(),
            field: field.into(),
        }
    }

    fn resolve(&self, data: &CredentialData) -> Result<SecretString, NodeError> {
        match self {
            Self::Literal(s) => Ok(SecretString::from(s.clone())),
            Self::Field { prefix, field } => {
                let value = data
                    .expose(field)
                    .ok_or_else(|| NodeError::MissingCredentialField(field.clone()))?;
                Ok(SecretString::from(format!("{prefix}{value}")))
            }
        }
    }
}

/// Generic authentication: headers added to every request tagged with the
/// credential type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    pub headers: Vec<(String, AuthValue)>,
}

impl Authentication {
    pub fn header(mut self, name: impl Into<String>, value: AuthValue) -> Self {
        self.headers.push((name.into(), value));
        self
    }

    /// Headers to inject, values kept secret until the host writes them.
    pub fn resolve_headers(
        &self,
        data: &CredentialData,
    ) -> Result<Vec<(String, SecretString)>, NodeError> {
        self.headers
            .iter()
            .map(|(name, value)| value.resolve(data).map(|v| (name.clone(), v)))
            .collect()
    }
}

/// Request the host issues to check that a credential instance works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialTestRequest {
    pub method: Method,
    /// Credential field holding the base URL.
    pub base_url_field: String,
    pub path: String,
}

impl CredentialTestRequest {
    pub fn url(&self, data: &CredentialData) -> Result<String, NodeError> {
        Ok(join_url(data.require_str(&self.base_url_field)?, &self.path))
    }
}

// ---------------------------------------------------------------------------
// CredentialType
// ---------------------------------------------------------------------------

/// Contract every credential type fulfils.
pub trait CredentialType: Send + Sync {
    /// Registry key, e.g. `atomaNetworkApi`.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn documentation_url(&self) -> Option<&str> {
        None
    }

    fn properties(&self) -> Vec<NodeProperty>;

    fn authenticate(&self) -> Authentication;

    fn test_request(&self) -> Option<CredentialTestRequest> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::PropertyType;
    use serde_json::json;

    fn props() -> Vec<NodeProperty> {
        vec![
            NodeProperty::new("API Key", "apiKey", PropertyType::String).password(),
            NodeProperty::new("Base URL", "baseURL", PropertyType::String)
                .with_default("https://default.example"),
        ]
    }

    #[test]
    fn from_properties_applies_defaults_and_drops_unknown_keys() {
        let raw = json!({ "apiKey": "k", "extra": "ignored" });
        let data = CredentialData::from_properties(&props(), raw.as_object().unwrap());

        assert_eq!(data.get_str("baseURL"), Some("https://default.example"));
        assert_eq!(data.expose("apiKey"), Some("k"));
        assert_eq!(data.expose("extra"), None);
    }

    #[test]
    fn secrets_are_hidden_from_get_str_and_debug() {
        let raw = json!({ "apiKey": "super-secret" });
        let data = CredentialData::from_properties(&props(), raw.as_object().unwrap());

        assert_eq!(data.get_str("apiKey"), None);
        assert!(!format!("{data:?}").contains("super-secret"));
        assert!(!format!("{:?}", data.clone()).contains("super-secret"));
    }

    #[test]
    fn field_header_is_prefixed() {
        let raw = json!({ "apiKey": "k" });
        let data = CredentialData::from_properties(&props(), raw.as_object().unwrap());
        let auth = Authentication::default()
            .header("Authorization", AuthValue::field("Bearer ", "apiKey"))
            .header("X-Static", AuthValue::Literal("1".into()));

        let headers = auth.resolve_headers(&data).unwrap();
        assert_eq!(headers[0].0, "Authorization");
        assert_eq!(headers[0].1.expose_secret(), "Bearer k");
        assert_eq!(headers[1].1.expose_secret(), "1");
    }

    #[test]
    fn missing_field_is_reported() {
        let auth = Authentication::default()
            .header("Authorization", AuthValue::field("Bearer ", "token"));
        let err = auth.resolve_headers(&CredentialData::default()).unwrap_err();
        assert!(matches!(err, NodeError::MissingCredentialField(f) if f == "token"));
    }
}
