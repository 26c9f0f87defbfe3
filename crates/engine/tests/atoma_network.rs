//! End-to-end tests for the Atoma Network node through the real host.
//!
//! A wiremock server stands in for the Atoma API; requests go through the
//! engine's authenticated HTTP helper exactly as in production.

use atoma_engine::{
    CredentialStore, CredentialTestResult, Edge, EngineError, ExecutorConfig, NodeDefinition,
    Registry, StoredCredential, Workflow, WorkflowExecutor,
};
use atoma_nodes::NodeError;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NODE_ID: &str = "Atoma Network";

fn executor_for(base_url: &str) -> WorkflowExecutor {
    let mut store = CredentialStore::new();
    store.insert(StoredCredential {
        name: "atoma".into(),
        credential_type: "atomaNetworkApi".into(),
        data: json!({ "apiKey": "k", "baseURL": base_url })
            .as_object()
            .cloned()
            .unwrap(),
    });
    WorkflowExecutor::new(Registry::with_builtins(), store, ExecutorConfig::default())
        .expect("executor should build")
}

fn atoma_node(continue_on_fail: bool) -> NodeDefinition {
    NodeDefinition::new(NODE_ID, "atomaNetworkNode")
        .with_parameter("model", json!("m1"))
        .with_credential("atomaNetworkApi", "atoma")
        .continuing_on_fail(continue_on_fail)
}

fn chat_workflow(continue_on_fail: bool) -> Workflow {
    Workflow::new(
        "chat",
        vec![
            NodeDefinition::new("input-trigger", "manualTrigger"),
            atoma_node(continue_on_fail),
        ],
        vec![Edge::new("input-trigger", NODE_ID)],
    )
}

fn user_message() -> Vec<Value> {
    vec![json!({ "role": "user", "content": "hi" })]
}

fn node_error(err: EngineError) -> NodeError {
    match err {
        EngineError::Node { source, .. } => source,
        other => panic!("expected a node error, got {other:?}"),
    }
}

// ============================================================
// getModels
// ============================================================

#[tokio::test]
async fn list_models_sends_bearer_and_maps_ids_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("Authorization", "Bearer k"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "id": "m1", "object": "model" }, { "id": "m2", "object": "model" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = executor_for(&server.uri());
    let options = executor
        .load_options(&atoma_node(false), "getModels")
        .await
        .expect("models should load");

    let ids: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
    for opt in &options {
        assert_eq!(opt.value, json!(opt.name));
        assert_eq!(opt.description.as_deref(), Some(opt.name.as_str()));
    }
}

#[tokio::test]
async fn list_models_success_false_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "invalid api key" })),
        )
        .mount(&server)
        .await;

    let err = executor_for(&server.uri())
        .load_options(&atoma_node(false), "getModels")
        .await
        .unwrap_err();

    let NodeError::Api(api) = node_error(err) else {
        panic!("expected an API error");
    };
    assert_eq!(api.message, "invalid api key");
    assert_eq!(api.payload["success"], json!(false));
}

#[tokio::test]
async fn list_models_http_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "unauthorized" } })),
        )
        .mount(&server)
        .await;

    let err = executor_for(&server.uri())
        .load_options(&atoma_node(false), "getModels")
        .await
        .unwrap_err();

    let NodeError::Api(api) = node_error(err) else {
        panic!("expected an API error");
    };
    assert_eq!(api.http_code, Some(401));
    assert_eq!(api.message, "unauthorized");
}

#[tokio::test]
async fn list_models_transport_failure_is_an_api_error() {
    // Nothing listens on port 1.
    let err = executor_for("http://127.0.0.1:1")
        .load_options(&atoma_node(false), "getModels")
        .await
        .unwrap_err();

    let NodeError::Api(api) = node_error(err) else {
        panic!("expected an API error");
    };
    assert_eq!(api.http_code, None);
}

#[tokio::test]
async fn list_models_without_credentials_is_an_api_error() {
    let executor =
        WorkflowExecutor::new(Registry::with_builtins(), CredentialStore::new(), ExecutorConfig::default())
            .unwrap();
    let err = executor
        .load_options(&atoma_node(false), "getModels")
        .await
        .unwrap_err();
    assert!(matches!(node_error(err), NodeError::Api(_)));
}

// ============================================================
// execute
// ============================================================

#[tokio::test]
async fn completion_returns_response_body_as_the_output_item() {
    let server = MockServer::start().await;
    let body = json!({
        "success": true,
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello!" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer k"))
        .and(body_json(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "model": "m1",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let result = executor_for(&server.uri())
        .run(&chat_workflow(false), user_message())
        .await
        .expect("run should succeed");

    assert_eq!(result.order, vec!["input-trigger", NODE_ID]);
    let output = result.output();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].json, body);
    assert_eq!(
        serde_json::to_string(&output[0].json).unwrap(),
        serde_json::to_string(&body).unwrap(),
        "field order must survive"
    );
    assert!(output[0].error.is_none());
}

#[tokio::test]
async fn completion_failure_aborts_with_item_index_on_the_original_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "model overloaded" })),
        )
        .mount(&server)
        .await;

    let err = executor_for(&server.uri())
        .run(&chat_workflow(false), user_message())
        .await
        .unwrap_err();

    let EngineError::Node { node_id, source } = err else {
        panic!("expected a node error");
    };
    assert_eq!(node_id, NODE_ID);
    let NodeError::Api(api) = source else {
        panic!("an error with a context must not be re-wrapped");
    };
    assert_eq!(api.context.item_index, Some(0));
    assert_eq!(api.message, "model overloaded");
}

#[tokio::test]
async fn completion_failure_with_continue_on_fail_emits_an_error_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let result = executor_for(&server.uri())
        .run(&chat_workflow(true), user_message())
        .await
        .expect("continue-on-fail keeps the run alive");

    let item = &result.output()[0];
    assert_eq!(item.json, json!({}));
    assert_eq!(item.paired_item, Some(0));
    let Some(NodeError::Api(api)) = &item.error else {
        panic!("expected an API error on the item");
    };
    assert_eq!(api.http_code, Some(500));
    assert_eq!(api.message, "upstream exploded");

    let rendered = serde_json::to_value(item).unwrap();
    assert_eq!(rendered["pairedItem"], 0);
    assert_eq!(rendered["error"]["name"], "NodeApiError");
}

#[tokio::test]
async fn invalid_messages_json_is_wrapped_in_an_operation_error() {
    let server = MockServer::start().await;
    let workflow = Workflow::new(
        "chat",
        vec![atoma_node(false).with_parameter("messages", json!("{ not json"))],
        vec![],
    );

    let err = executor_for(&server.uri()).run(&workflow, vec![]).await.unwrap_err();

    let NodeError::Operation(op) = node_error(err) else {
        panic!("expected an operation error");
    };
    assert_eq!(op.context.item_index, Some(0));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn each_trigger_item_gets_its_own_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .expect(2)
        .mount(&server)
        .await;

    // Per-item messages via a template over the current item.
    let mut workflow = chat_workflow(false);
    workflow.nodes[1].parameters.insert(
        "messages".into(),
        json!(r#"=[{ "role": "user", "content": "{{ $json.content }}" }]"#),
    );

    let result = executor_for(&server.uri())
        .run(&workflow, vec![json!({ "content": "a" }), json!({ "content": "b" })])
        .await
        .unwrap();

    assert_eq!(result.output().len(), 2);
    let requests = server.received_requests().await.unwrap();
    let sent: Vec<Value> = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["messages"][0]["content"].clone())
        .collect();
    assert_eq!(sent, vec![json!("a"), json!("b")]);
}

#[tokio::test]
async fn literal_message_content_is_sent_verbatim() {
    let server = MockServer::start().await;
    let messages = json!([
        { "role": "user", "content": "Explain {{ mustache }} templates" },
        { "role": "user", "content": "=SUM(A1:A3) in a spreadsheet?" }
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_json(json!({ "messages": messages, "model": "m1", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let workflow = Workflow::new(
        "chat",
        vec![atoma_node(false).with_parameter("messages", messages.clone())],
        vec![],
    );

    let result = executor_for(&server.uri())
        .run(&workflow, vec![])
        .await
        .expect("literal braces and '=' are not expressions");
    assert_eq!(result.output()[0].json, json!({ "choices": [] }));
}

// ============================================================
// Credential test
// ============================================================

#[tokio::test]
async fn credential_test_passes_on_healthy_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("Authorization", "Bearer k"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = executor_for(&server.uri()).test_credential("atoma").await.unwrap();
    assert!(matches!(result, CredentialTestResult::Ok { .. }));
}

#[tokio::test]
async fn credential_test_uses_the_named_instance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("Authorization", "Bearer staging-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = CredentialStore::new();
    for (name, key, url) in [
        ("prod", "prod-key", "http://127.0.0.1:1".to_owned()),
        ("staging", "staging-key", server.uri()),
    ] {
        store.insert(StoredCredential {
            name: name.into(),
            credential_type: "atomaNetworkApi".into(),
            data: json!({ "apiKey": key, "baseURL": url }).as_object().cloned().unwrap(),
        });
    }
    let executor =
        WorkflowExecutor::new(Registry::with_builtins(), store, ExecutorConfig::default()).unwrap();

    let result = executor.test_credential("staging").await.unwrap();
    assert!(matches!(result, CredentialTestResult::Ok { .. }));
}

#[tokio::test]
async fn credential_test_reports_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = executor_for(&server.uri()).test_credential("atoma").await.unwrap();
    let CredentialTestResult::Error { message } = result else {
        panic!("expected a failed test");
    };
    assert_eq!(message, "Service Unavailable");
}

#[tokio::test]
async fn credential_test_of_unknown_instance_fails() {
    let err = executor_for("http://localhost").test_credential("nope").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownCredential(n) if n == "nope"));
}
