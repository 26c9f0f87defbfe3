//! Request description handed to the host's authenticated HTTP helper.

use serde::Serialize;
use serde_json::Value;

/// HTTP verbs nodes may ask the host to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A single request. The host adds authentication headers before sending.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HttpRequestOptions {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl HttpRequestOptions {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            ..Self::default()
        }
    }
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("https://api.atoma.network/", "/v1/models"),
            "https://api.atoma.network/v1/models"
        );
        assert_eq!(
            join_url("http://localhost:8080", "health"),
            "http://localhost:8080/health"
        );
    }
}
