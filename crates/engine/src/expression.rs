//! Parameter expression resolution.
//!
//! Only a top-level string parameter can be an expression:
//!
//! - `{{ expr }}` or `={{ expr }}`: the whole value is the expression's JSON
//!   result.
//! - `=text {{ expr }} text`: a template; each expression is rendered into
//!   the string.
//!
//! Any other value, including every string nested in an array or object, is
//! returned as written.
//!
//! Supported expressions:
//! - `$("node").all().map(e => e.json)` — every item the node emitted
//! - `$("node").first().json`, `$("node").last().json`
//! - `$("node").item.json` — the node's item at the current index
//! - `$json` — the current input item
//!
//! The single-item forms accept a trailing field path (`$json.user.name`).

use std::collections::HashMap;
use std::sync::OnceLock;

use atoma_nodes::NodeExecutionData;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unsupported expression '{0}'")]
    Unsupported(String),

    #[error("node '{0}' has not produced any output in this run")]
    UnknownNode(String),

    #[error("node '{node}' has no item at index {index}")]
    MissingItem { node: String, index: usize },

    #[error("unterminated '{{{{' in parameter value")]
    Unterminated,
}

/// Data visible to expressions while resolving one parameter.
pub struct Scope<'a> {
    /// Outputs (first connection) of every node that already ran.
    pub outputs: &'a HashMap<String, Vec<NodeExecutionData>>,
    /// Items on the current node's input.
    pub input: &'a [NodeExecutionData],
    pub item_index: usize,
}

/// Resolve `value` if it is an expression string.
pub fn resolve(value: &Value, scope: &Scope<'_>) -> Result<Value, ExpressionError> {
    let Value::String(raw) = value else {
        return Ok(value.clone());
    };

    if let Some(text) = raw.strip_prefix('=') {
        return match whole_expression(text) {
            Some(inner) => evaluate(inner, scope),
            None if text.contains("{{") => render_template(text, scope).map(Value::String),
            None => Ok(Value::String(text.to_owned())),
        };
    }

    match whole_expression(raw) {
        Some(inner) => evaluate(inner, scope),
        None => Ok(value.clone()),
    }
}

/// The inner expression when `text` is exactly one `{{ … }}` block.
fn whole_expression(text: &str) -> Option<&str> {
    let inner = text
        .trim()
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn render_template(text: &str, scope: &Scope<'_>) -> Result<String, ExpressionError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(ExpressionError::Unterminated)?;
        match evaluate(after[..end].trim(), scope)? {
            Value::String(s) => out.push_str(&s),
            Value::Null => {}
            other => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn all_items_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\$\(\s*["']([^"']+)["']\s*\)\.all\(\)\.map\(\s*(\w+)\s*=>\s*(\w+)\.json\s*\)$"#)
            .expect("static regex")
    })
}

fn single_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\$\(\s*["']([^"']+)["']\s*\)\.(first\(\)|last\(\)|item)\.json((?:\.\w+)*)$"#)
            .expect("static regex")
    })
}

fn current_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$json((?:\.\w+)*)$").expect("static regex"))
}

fn evaluate(expr: &str, scope: &Scope<'_>) -> Result<Value, ExpressionError> {
    if let Some(caps) = all_items_re().captures(expr) {
        if caps[2] != caps[3] {
            return Err(ExpressionError::Unsupported(expr.to_owned()));
        }
        let items = node_output(scope, &caps[1])?;
        return Ok(Value::Array(items.iter().map(|i| i.json.clone()).collect()));
    }

    if let Some(caps) = single_item_re().captures(expr) {
        let node = &caps[1];
        let items = node_output(scope, node)?;
        let index = match &caps[2] {
            "first()" => 0,
            "last()" => items.len().saturating_sub(1),
            _ => scope.item_index,
        };
        let item = items.get(index).ok_or_else(|| ExpressionError::MissingItem {
            node: node.to_owned(),
            index,
        })?;
        return Ok(walk(&item.json, &caps[3]));
    }

    if let Some(caps) = current_item_re().captures(expr) {
        let json = scope
            .input
            .get(scope.item_index)
            .map(|i| &i.json)
            .unwrap_or(&Value::Null);
        return Ok(walk(json, &caps[1]));
    }

    Err(ExpressionError::Unsupported(expr.to_owned()))
}

fn node_output<'a>(
    scope: &Scope<'a>,
    node: &str,
) -> Result<&'a [NodeExecutionData], ExpressionError> {
    scope
        .outputs
        .get(node)
        .map(Vec::as_slice)
        .ok_or_else(|| ExpressionError::UnknownNode(node.to_owned()))
}

/// Follow a `.a.b.c` path; missing fields yield `null`.
fn walk(value: &Value, path: &str) -> Value {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(value, |v, key| v.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}
