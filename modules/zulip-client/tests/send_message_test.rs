//! Exercises the client against a local axum server standing in for Zulip.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Router,
};
use zulip_client::{StreamMessage, ZulipClient, ZulipError, ZulipOptions};

#[derive(Debug, Clone)]
struct Captured {
    authorization: Option<String>,
    form: HashMap<String, String>,
}

#[derive(Clone)]
struct ServerState {
    captured: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
    body: &'static str,
    delay: Duration,
}

async fn messages(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    tokio::time::sleep(state.delay).await;
    state.captured.lock().unwrap().push(Captured {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        form,
    });
    (state.status, state.body)
}

/// Start a fake Zulip on an ephemeral port and return its base URL.
async fn spawn_server(state: ServerState) -> String {
    let app = Router::new()
        .route("/api/v1/messages", post(messages))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1")
}

fn server_state(status: StatusCode, body: &'static str) -> ServerState {
    ServerState {
        captured: Arc::new(Mutex::new(Vec::new())),
        status,
        body,
        delay: Duration::ZERO,
    }
}

fn client_for(base_url: String) -> ZulipClient {
    let mut options = ZulipOptions::new("bot@example.com", "secret-key");
    options.base_url = base_url;
    options.timeout = Duration::from_millis(500);
    ZulipClient::new(options).unwrap()
}

fn broadcast_message() -> StreamMessage {
    StreamMessage {
        stream: "bot-test".to_string(),
        topic: "broadcasts".to_string(),
        content: "test - Tom Ballinger".to_string(),
    }
}

#[tokio::test]
async fn posts_form_with_basic_auth() {
    let state = server_state(
        StatusCode::OK,
        r#"{"result":"success","msg":"","id":42}"#,
    );
    let captured = state.captured.clone();
    let client = client_for(spawn_server(state).await);

    let id = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap();
    assert_eq!(id, Some(42));

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.authorization.as_deref(),
        Some("Basic Ym90QGV4YW1wbGUuY29tOnNlY3JldC1rZXk=")
    );
    assert_eq!(request.form.get("type").map(String::as_str), Some("stream"));
    assert_eq!(request.form.get("to").map(String::as_str), Some("bot-test"));
    assert_eq!(
        request.form.get("subject").map(String::as_str),
        Some("broadcasts")
    );
    assert_eq!(
        request.form.get("content").map(String::as_str),
        Some("test - Tom Ballinger")
    );
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let state = server_state(StatusCode::UNAUTHORIZED, "invalid API key");
    let client = client_for(spawn_server(state).await);

    let err = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap_err();
    match err {
        ZulipError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid API key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_envelope_is_api_error() {
    let state = server_state(
        StatusCode::OK,
        r#"{"result":"error","msg":"Stream 'bot-test' does not exist"}"#,
    );
    let client = client_for(spawn_server(state).await);

    let err = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap_err();
    assert!(matches!(err, ZulipError::Api { status: 200, ref message } if message.contains("does not exist")));
}

#[tokio::test]
async fn empty_success_body_is_accepted() {
    let state = server_state(StatusCode::OK, "");
    let client = client_for(spawn_server(state).await);

    let id = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn truncated_success_body_is_still_accepted() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        // The form body ends with the message content.
        while !String::from_utf8_lossy(&request).ends_with("Ballinger") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"result\":")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = client_for(format!("http://{addr}/api/v1"));
    let id = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn slow_server_hits_timeout() {
    let mut state = server_state(StatusCode::OK, r#"{"result":"success"}"#);
    state.delay = Duration::from_secs(3);
    let client = client_for(spawn_server(state).await);

    let err = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap_err();
    assert!(matches!(err, ZulipError::Network(_)));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{addr}/api/v1"));
    let err = client
        .send_stream_message(&broadcast_message())
        .await
        .unwrap_err();
    assert!(matches!(err, ZulipError::Network(_)));
}
