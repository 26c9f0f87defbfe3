//! Declarative metadata: the field lists and node/credential descriptors a
//! host renders and validates against.

use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Widget/value kind of a configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    /// Single-select; options are static or produced by a load-options method.
    Options,
    /// Free-form JSON text.
    Json,
}

/// Extra rendering/behaviour hints for a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOptions {
    /// Mask the value in the UI and treat it as a secret.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub password: bool,
    /// Name of the method that populates an `Options` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_options_method: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub always_open_edit_window: bool,
}

/// One configurable field of a node or credential type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub default: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_default_type_options")]
    pub type_options: TypeOptions,
}

fn is_default_type_options(opts: &TypeOptions) -> bool {
    *opts == TypeOptions::default()
}

impl NodeProperty {
    /// A field with an empty-string default and no hints.
    pub fn new(
        display_name: impl Into<String>,
        name: impl Into<String>,
        property_type: PropertyType,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            name: name.into(),
            property_type,
            default: Value::String(String::new()),
            required: false,
            description: None,
            type_options: TypeOptions::default(),
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn password(mut self) -> Self {
        self.type_options.password = true;
        self
    }

    pub fn load_options_from(mut self, method: impl Into<String>) -> Self {
        self.type_options.load_options_method = Some(method.into());
        self
    }

    pub fn always_open_edit_window(mut self) -> Self {
        self.type_options.always_open_edit_window = true;
        self
    }
}

/// One entry of an `Options` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyOption {
    /// Display label.
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Node type description
// ---------------------------------------------------------------------------

/// Connection kind on a node's input or output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionType {
    Main,
}

/// A credential type the node can authenticate with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRequirement {
    pub name: String,
    pub required: bool,
}

/// Everything a host needs to list, render and wire a node type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDescription {
    pub display_name: String,
    /// Registry key.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub group: Vec<String>,
    pub version: u32,
    pub description: String,
    /// Default instance name when the node is added to a workflow.
    pub default_name: String,
    pub credentials: Vec<CredentialRequirement>,
    pub inputs: Vec<ConnectionType>,
    pub outputs: Vec<ConnectionType>,
    pub properties: Vec<NodeProperty>,
}

impl NodeTypeDescription {
    /// Look up a property by its `name`.
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}
