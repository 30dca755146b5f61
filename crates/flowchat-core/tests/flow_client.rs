//! Flow client and chat session against a local mock of the run endpoint.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use flowchat_core::{ChatRole, ChatSession, FlowClient, FlowError, Settings, Tweaks};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Captured {
    tenant: String,
    flow: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

fn settings_for(base_url: &str) -> Settings {
    Settings {
        base_url: base_url.to_string(),
        tenant_id: "tenant-1".to_string(),
        flow_id: "default-flow".to_string(),
        application_token: "test-token".to_string(),
        tweaks: Tweaks::new(),
    }
}

fn reply(text: &str) -> Value {
    json!({"outputs": [{"outputs": [{"results": {"message": {"text": text}}}]}]})
}

async fn spawn_server(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("read test listener addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), handle)
}

/// Echo server: replies `echo: <input>`, fails with 500 when the input is `fail`.
async fn spawn_echo_server() -> (String, Log, tokio::task::JoinHandle<()>) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/lf/:tenant/api/v1/run/:flow",
            post(
                |State(log): State<Log>,
                 Path((tenant, flow)): Path<(String, String)>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    let input = body["input_value"].as_str().unwrap_or_default().to_string();
                    log.lock().unwrap().push(Captured {
                        tenant,
                        flow,
                        authorization: header("authorization"),
                        content_type: header("content-type"),
                        body,
                    });
                    if input == "fail" {
                        (StatusCode::INTERNAL_SERVER_ERROR, "flow crashed").into_response()
                    } else {
                        Json(reply(&format!("echo: {input}"))).into_response()
                    }
                },
            ),
        )
        .with_state(log.clone());
    let (base_url, handle) = spawn_server(app).await;
    (base_url, log, handle)
}

async fn spawn_fixed_server(
    status: StatusCode,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new().route(
        "/lf/:tenant/api/v1/run/:flow",
        post(move || async move { (status, body) }),
    );
    spawn_server(app).await
}

#[tokio::test]
async fn test_hello_round_trip() {
    let (base_url, server) = spawn_fixed_server(
        StatusCode::OK,
        r#"{"outputs":[{"outputs":[{"results":{"message":{"text":"hi there"}}}]}]}"#,
    )
    .await;

    let client = FlowClient::new(settings_for(&base_url));
    let result = client.run_flow("hello", None, None).await;
    server.abort();

    assert_eq!(result.unwrap(), "hi there");
}

#[tokio::test]
async fn test_request_shape_and_auth() {
    let (base_url, log, server) = spawn_echo_server().await;
    let client = FlowClient::new(settings_for(&base_url));

    let text = client.run_flow("hello", None, None).await.unwrap();
    server.abort();
    assert_eq!(text, "echo: hello");

    let captured = log.lock().unwrap()[0].clone();
    assert_eq!(captured.tenant, "tenant-1");
    assert_eq!(captured.flow, "default-flow");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        captured.body,
        json!({"input_value": "hello", "output_type": "chat", "input_type": "chat"})
    );
}

#[tokio::test]
async fn test_endpoint_and_tweaks_are_forwarded() {
    let (base_url, log, server) = spawn_echo_server().await;
    let mut settings = settings_for(&base_url);
    settings
        .tweaks
        .insert("ChatInput-Anfqy".to_string(), json!({}));
    let client = FlowClient::new(settings);

    client.run_flow("one", None, None).await.unwrap();

    let mut override_tweaks = Tweaks::new();
    override_tweaks.insert("Prompt-tWgfz".to_string(), json!({"template": "{question}"}));
    client
        .run_flow("two", Some("other-flow"), Some(&override_tweaks))
        .await
        .unwrap();

    client.run_flow("three", None, Some(&Tweaks::new())).await.unwrap();
    server.abort();

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured[0].body["tweaks"], json!({"ChatInput-Anfqy": {}}));
    assert_eq!(captured[1].flow, "other-flow");
    assert_eq!(
        captured[1].body["tweaks"],
        json!({"Prompt-tWgfz": {"template": "{question}"}})
    );
    assert!(captured[2].body.get("tweaks").is_none());
}

#[tokio::test]
async fn test_http_error_status() {
    let (base_url, server) = spawn_fixed_server(StatusCode::UNAUTHORIZED, "bad token").await;
    let client = FlowClient::new(settings_for(&base_url));

    let err = client.run_flow("hello", None, None).await.unwrap_err();
    server.abort();

    assert!(matches!(&err, FlowError::Http { status, .. } if status.as_u16() == 401));
    let message = err.to_string();
    assert!(!message.is_empty());
    assert!(message.contains("401"), "unexpected error message: {message}");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (base_url, server) = spawn_fixed_server(StatusCode::OK, "not json").await;
    let client = FlowClient::new(settings_for(&base_url));

    let err = client.run_flow("hello", None, None).await.unwrap_err();
    server.abort();

    assert!(matches!(err, FlowError::Parse(_)));
    assert!(err.to_string().contains("JSON"), "unexpected error message: {err}");
}

#[tokio::test]
async fn test_missing_outputs_is_unexpected_structure() {
    let (base_url, server) = spawn_fixed_server(StatusCode::OK, r#"{"outputs": []}"#).await;
    let client = FlowClient::new(settings_for(&base_url));

    let err = client.run_flow("hello", None, None).await.unwrap_err();
    server.abort();

    assert_eq!(err.to_string(), "Unexpected response structure");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("read probe addr");
    drop(listener);

    let client = FlowClient::new(settings_for(&format!("http://{addr}")));
    let err = client.run_flow("hello", None, None).await.unwrap_err();

    assert!(matches!(err, FlowError::Transport(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_session_alternates_on_success() {
    let (base_url, _log, server) = spawn_echo_server().await;
    let mut session = ChatSession::start(settings_for(&base_url));

    for i in 0..3 {
        let turn = session.submit(&format!("message {i}")).await.unwrap();
        assert_eq!(turn.role(), ChatRole::Assistant);
    }
    let transcript = session.end();
    server.abort();

    assert_eq!(transcript.len(), 6);
    for (i, turn) in transcript.all().iter().enumerate() {
        let expected = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
        assert_eq!(turn.role(), expected);
    }
    assert_eq!(transcript.all()[5].text(), "echo: message 2");
}

#[tokio::test]
async fn test_session_records_error_and_continues() {
    let (base_url, _log, server) = spawn_echo_server().await;
    let mut session = ChatSession::start(settings_for(&base_url));

    let turn = session.submit("fail").await.unwrap();
    assert_eq!(turn.role(), ChatRole::Error);
    assert!(turn.text().contains("500"));

    let turn = session.submit("again").await.unwrap();
    assert_eq!(turn.role(), ChatRole::Assistant);
    server.abort();

    let roles: Vec<ChatRole> = session.transcript().all().iter().map(|t| t.role()).collect();
    assert_eq!(
        roles,
        vec![ChatRole::User, ChatRole::Error, ChatRole::User, ChatRole::Assistant]
    );
}

#[tokio::test]
async fn test_session_ignores_blank_input() {
    let mut session = ChatSession::start(settings_for("http://127.0.0.1:9"));
    assert!(session.submit("   ").await.is_none());
    assert!(session.transcript().is_empty());
}
