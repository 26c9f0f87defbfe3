//! In-memory credential store.
//!
//! Instances are kept as the raw values the user entered; they are resolved
//! against their credential type (defaults, secret marking) each time a node
//! asks for them.

use std::fmt;

use atoma_nodes::{CredentialData, CredentialType, NodeError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One configured credential instance.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Instance name, referenced from node definitions.
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("name", &self.name)
            .field("credential_type", &self.credential_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    entries: Vec<StoredCredential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance, replacing any previous one with the same name.
    pub fn insert(&mut self, credential: StoredCredential) {
        self.entries.retain(|c| c.name != credential.name);
        self.entries.push(credential);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StoredCredential> {
        self.entries.iter().find(|c| c.name == name)
    }

    /// Find the instance of `credential_type` to use.
    ///
    /// With an explicit `instance` name that instance must exist and have the
    /// right type; otherwise the first instance of the type is used.
    pub fn find(
        &self,
        credential_type: &str,
        instance: Option<&str>,
    ) -> Result<&StoredCredential, NodeError> {
        let found = match instance {
            Some(name) => self.get(name),
            None => self.entries.iter().find(|c| c.credential_type == credential_type),
        };

        found
            .filter(|c| c.credential_type == credential_type)
            .ok_or_else(|| NodeError::MissingCredentials(credential_type.to_owned()))
    }

    /// Resolve an instance against its type's field list.
    pub fn resolve(
        &self,
        credential_type: &dyn CredentialType,
        instance: Option<&str>,
    ) -> Result<CredentialData, NodeError> {
        let stored = self.find(credential_type.name(), instance)?;
        Ok(CredentialData::from_properties(
            &credential_type.properties(),
            &stored.data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atoma_nodes::AtomaNetworkApi;
    use serde_json::json;

    fn stored(name: &str, ty: &str, data: Value) -> StoredCredential {
        StoredCredential {
            name: name.into(),
            credential_type: ty.into(),
            data: data.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn find_by_type_uses_first_instance() {
        let mut store = CredentialStore::new();
        store.insert(stored("prod", "atomaNetworkApi", json!({ "apiKey": "a" })));
        store.insert(stored("staging", "atomaNetworkApi", json!({ "apiKey": "b" })));

        assert_eq!(store.find("atomaNetworkApi", None).unwrap().name, "prod");
        assert_eq!(store.find("atomaNetworkApi", Some("staging")).unwrap().name, "staging");
    }

    #[test]
    fn named_instance_of_wrong_type_is_missing() {
        let mut store = CredentialStore::new();
        store.insert(stored("other", "openAiApi", json!({})));

        let err = store.find("atomaNetworkApi", Some("other")).unwrap_err();
        assert!(matches!(err, NodeError::MissingCredentials(t) if t == "atomaNetworkApi"));
    }

    #[test]
    fn insert_replaces_same_name() {
        let mut store = CredentialStore::new();
        store.insert(stored("prod", "atomaNetworkApi", json!({ "apiKey": "old" })));
        store.insert(stored("prod", "atomaNetworkApi", json!({ "apiKey": "new" })));
        assert_eq!(store.len(), 1);

        let data = store.resolve(&AtomaNetworkApi, None).unwrap();
        assert_eq!(data.expose("apiKey"), Some("new"));
        assert_eq!(data.get_str("baseURL"), Some("https://api.atoma.network"));
    }

    #[test]
    fn debug_never_prints_values() {
        let mut store = CredentialStore::new();
        store.insert(stored("prod", "atomaNetworkApi", json!({ "apiKey": "sk-live" })));
        assert!(!format!("{store:?}").contains("sk-live"));
    }

    #[test]
    fn deserializes_from_config_json() {
        let cred: StoredCredential = serde_json::from_value(json!({
            "name": "atoma",
            "type": "atomaNetworkApi",
            "data": { "apiKey": "k" }
        }))
        .unwrap();
        assert_eq!(cred.credential_type, "atomaNetworkApi");
    }
}
