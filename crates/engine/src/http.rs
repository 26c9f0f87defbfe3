//! The authenticated HTTP helper nodes call through their context.
//!
//! Applies a credential type's generic authentication, sends the request with
//! `reqwest` and decodes the JSON body. Every failure is reported as a
//! [`NodeApiError`]: transport errors carry `{ "message": … }`, non-2xx
//! responses carry the decoded body and the status code.

use atoma_nodes::{
    CredentialData, CredentialType, HttpRequestOptions, Method, NodeApiError, NodeError, NodeInfo,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::EngineError;

/// Outcome of a credential test request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CredentialTestResult {
    Ok { message: String },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ExecutorConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Send `request` authenticated with `credential_type` / `data`.
    pub async fn send_authenticated(
        &self,
        node: &NodeInfo,
        credential_type: &dyn CredentialType,
        data: &CredentialData,
        request: HttpRequestOptions,
    ) -> Result<Value, NodeError> {
        let auth_headers = credential_type.authenticate().resolve_headers(data)?;
        self.send(node, request, &auth_headers).await
    }

    /// Issue the credential type's test request; any 2xx status passes.
    pub async fn test_credential(
        &self,
        node: &NodeInfo,
        credential_type: &dyn CredentialType,
        data: &CredentialData,
    ) -> Result<CredentialTestResult, EngineError> {
        let test = credential_type
            .test_request()
            .ok_or_else(|| EngineError::CredentialNotTestable(credential_type.name().to_owned()))?;

        let outcome = match test.url(data) {
            Ok(url) => {
                let request = HttpRequestOptions {
                    method: test.method,
                    url,
                    ..HttpRequestOptions::default()
                };
                self.send_authenticated(node, credential_type, data, request).await
            }
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(_) => CredentialTestResult::Ok {
                message: "Connection tested successfully".into(),
            },
            Err(e) => CredentialTestResult::Error {
                message: e.to_string(),
            },
        })
    }

    async fn send(
        &self,
        node: &NodeInfo,
        request: HttpRequestOptions,
        auth_headers: &[(String, SecretString)],
    ) -> Result<Value, NodeError> {
        debug!(node = %node.name, method = request.method.as_str(), url = %request.url, "sending request");

        let mut headers = HeaderMap::new();
        for (name, value) in auth_headers {
            let (name, mut value) = auth_header(node, name, value.expose_secret())?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(node, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(node, e.to_string()))?;

        if !status.is_success() {
            warn!(node = %node.name, status = status.as_u16(), url = %request.url, "request failed");
            let payload = match serde_json::from_str::<Value>(&text) {
                Ok(body) if !body.is_null() => body,
                _ if text.trim().is_empty() => json!({
                    "message": status.canonical_reason().unwrap_or("request failed")
                }),
                _ => json!({ "message": text }),
            };
            return Err(NodeApiError::new(node, payload)
                .with_http_code(status.as_u16())
                .into());
        }

        Ok(decode_success(&text))
    }
}

fn auth_header(
    node: &NodeInfo,
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), NodeError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| transport_error(node, format!("invalid header name '{name}': {e}")))?;
    // The value may be a secret; keep it out of the message.
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| transport_error(node, format!("invalid value for header '{name}'")))?;
    Ok((header_name, header_value))
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
    }
}

/// JSON when it parses, the raw text otherwise, `null` for an empty body.
fn decode_success(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

fn transport_error(node: &NodeInfo, message: String) -> NodeError {
    NodeApiError::new(node, json!({ "message": message })).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_decoding() {
        assert_eq!(decode_success(""), Value::Null);
        assert_eq!(decode_success(r#"{"ok":true}"#), json!({ "ok": true }));
        assert_eq!(decode_success("healthy"), json!("healthy"));
    }

    #[test]
    fn secret_header_value_never_reaches_the_error_message() {
        let node = NodeInfo::new("n", "t");
        let err = auth_header(&node, "Authorization", "Bearer sk\nlive").unwrap_err();
        assert!(!err.to_string().contains("sk"));
    }
}
