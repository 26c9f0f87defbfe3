//! Wire types for the Atoma Network API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    /// Opaque; expected to be a list of chat-message objects.
    pub messages: Value,
    pub model: String,
    /// Streaming is not supported; always `false`.
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: String, messages: Value) -> Self {
        Self {
            messages,
            model,
            stream: false,
        }
    }
}

/// Response of `GET /v1/models`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

/// `true` when the body carries an explicit `success: false` marker.
pub fn is_failure(body: &Value) -> bool {
    body.get("success") == Some(&Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_messages_model_stream() {
        let req = ChatCompletionRequest::new("m1".into(), json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"messages":[{"role":"user","content":"hi"}],"model":"m1","stream":false}"#
        );
    }

    #[test]
    fn only_literal_false_counts_as_failure() {
        assert!(is_failure(&json!({ "success": false })));
        assert!(!is_failure(&json!({ "success": true })));
        assert!(!is_failure(&json!({ "success": "false" })));
        assert!(!is_failure(&json!({ "choices": [] })));
    }
}
