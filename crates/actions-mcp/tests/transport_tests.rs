//! Transport Integration Tests
//!
//! Drives the stream transport over an in-memory duplex pipe and the SSE
//! transport through its axum router, with a recording stub standing in
//! for the platform.

use std::sync::Arc;
use std::time::Duration;

use actions_mcp::{ActionsMcpServer, Dispatcher, SseTransport, StreamTransport};
use actions_test_utils::StubActions;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Notify;
use tower::ServiceExt;

fn setup_server() -> (ActionsMcpServer, Arc<StubActions>) {
    setup_server_with(StubActions::new())
}

fn setup_server_with(stub: StubActions) -> (ActionsMcpServer, Arc<StubActions>) {
    let stub = Arc::new(stub);
    (ActionsMcpServer::new(Dispatcher::new(stub.clone())), stub)
}

/// Poll `condition` every few milliseconds until it holds.
async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", what));
}

fn trigger_request(id: u64) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": "trigger-workflow",
            "arguments": { "owner": "acme", "repo": "widgets", "workflowId": "ci.yml", "ref": "main" }
        }
    })
    .to_string()
}

// ==========================================================================
// Stream transport
// ==========================================================================

#[tokio::test]
async fn test_stream_transport_round_trip() {
    let (server, stub) = setup_server();
    let (client, server_side) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_side);

    let transport = StreamTransport::new(BufReader::new(server_read), server_write);
    let serving = tokio::spawn(async move { transport.run(&server).await });

    let (client_read, mut client_write) = tokio::io::split(client);
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#.to_string(),
        String::new(),
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string(),
        trigger_request(2),
        "not json at all".to_string(),
    ];
    for line in &input {
        client_write.write_all(line.as_bytes()).await.unwrap();
        client_write.write_all(b"\n").await.unwrap();
    }
    client_write.shutdown().await.unwrap();

    serving.await.unwrap().unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let mut responses = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        responses.push(serde_json::from_str::<Value>(&line).unwrap());
    }

    assert_eq!(responses.len(), 3, "notification and blank line get no reply");
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "actions-mcp");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["isError"], false);
    assert_eq!(responses[2]["error"]["code"], -32700);
    assert!(responses[2]["id"].is_null());

    assert_eq!(stub.call_count_for("trigger_workflow"), 1);
}

#[tokio::test]
async fn test_stream_transport_survives_invalid_utf8() {
    let (server, stub) = setup_server();
    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":\xff}\n".to_vec();
    input.extend_from_slice(trigger_request(2).as_bytes());
    input.push(b'\n');

    let mut output = Vec::new();
    StreamTransport::new(BufReader::new(&input[..]), &mut output)
        .run(&server)
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["isError"], false);
    assert_eq!(stub.call_count_for("trigger_workflow"), 1);
}

#[tokio::test]
async fn test_stream_transport_ends_on_empty_input() {
    let (server, stub) = setup_server();
    let transport = StreamTransport::new(BufReader::new(&b""[..]), tokio::io::sink());

    transport.run(&server).await.unwrap();
    assert_eq!(stub.call_count(), 0);
}

// ==========================================================================
// SSE transport
// ==========================================================================

fn setup_sse() -> (SseTransport, Router, Arc<StubActions>) {
    let (server, stub) = setup_server();
    let transport = SseTransport::new("127.0.0.1:0".parse().unwrap());
    let app = transport.router(server);
    (transport, app, stub)
}

/// Read body frames until one carries an event of the given kind, and
/// return its `data:` payload.
async fn next_event(body: &mut Body, kind: &str) -> String {
    let wanted = format!("event: {}", kind);
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = body.frame().await.unwrap().unwrap();
            let Ok(bytes) = frame.into_data() else {
                continue;
            };
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            if !text.lines().any(|line| line == wanted) {
                continue;
            }
            let data: Vec<&str> = text
                .lines()
                .filter_map(|line| line.strip_prefix("data: "))
                .collect();
            return data.join("\n");
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn open_session(app: &Router) -> (Body, String) {
    let response = app
        .clone()
        .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let endpoint = next_event(&mut body, "endpoint").await;
    (body, endpoint)
}

async fn post(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_sse_endpoint_event_names_session() {
    let (transport, app, _) = setup_sse();

    let (_body, endpoint) = open_session(&app).await;

    let session_id = endpoint.strip_prefix("/messages?sessionId=").unwrap();
    assert_eq!(session_id.len(), 36);
    assert_eq!(transport.sessions().len(), 1);
}

#[tokio::test]
async fn test_sse_round_trip() {
    let (_transport, app, stub) = setup_sse();
    let (mut body, endpoint) = open_session(&app).await;

    let (status, text) = post(&app, &endpoint, trigger_request(9)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(text, "Accepted");

    let message: Value = serde_json::from_str(&next_event(&mut body, "message").await).unwrap();
    assert_eq!(message["id"], 9);
    assert_eq!(message["result"]["isError"], false);
    assert_eq!(stub.call_count_for("trigger_workflow"), 1);
}

#[tokio::test]
async fn test_sse_sessions_are_isolated() {
    let (transport, app, _) = setup_sse();
    let (mut first, first_endpoint) = open_session(&app).await;
    let (mut second, second_endpoint) = open_session(&app).await;

    assert_ne!(first_endpoint, second_endpoint);
    assert_eq!(transport.sessions().len(), 2);

    let ping = |id: &str| json!({ "jsonrpc": "2.0", "id": id, "method": "ping" }).to_string();
    post(&app, &second_endpoint, ping("to-second")).await;
    post(&app, &first_endpoint, ping("to-first")).await;

    let reply: Value = serde_json::from_str(&next_event(&mut first, "message").await).unwrap();
    assert_eq!(reply["id"], "to-first");
    let reply: Value = serde_json::from_str(&next_event(&mut second, "message").await).unwrap();
    assert_eq!(reply["id"], "to-second");
}

#[tokio::test]
async fn test_sse_requests_in_session_are_answered_in_order() {
    let (_transport, app, _) = setup_sse();
    let (mut body, endpoint) = open_session(&app).await;

    for id in 1..=5 {
        let (status, _) = post(&app, &endpoint, trigger_request(id)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    for id in 1..=5 {
        let message: Value = serde_json::from_str(&next_event(&mut body, "message").await).unwrap();
        assert_eq!(message["id"], id);
    }
}

#[tokio::test]
async fn test_sse_unknown_session_is_rejected() {
    let (_transport, app, stub) = setup_sse();

    let (status, text) = post(
        &app,
        "/messages?sessionId=00000000-0000-4000-8000-000000000000",
        trigger_request(1),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "No transport found for sessionId");
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_sse_missing_session_id() {
    let (_transport, app, stub) = setup_sse();

    let (status, text) = post(&app, "/messages", trigger_request(1)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Missing sessionId query parameter");
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_sse_invalid_json_body() {
    let (_transport, app, stub) = setup_sse();
    let (_body, endpoint) = open_session(&app).await;

    let (status, _) = post(&app, &endpoint, "{\"jsonrpc\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_sse_disconnect_closes_session() {
    let (transport, app, stub) = setup_sse();
    let (body, endpoint) = open_session(&app).await;
    assert_eq!(transport.sessions().len(), 1);

    drop(body);
    assert!(transport.sessions().is_empty());

    let (status, text) = post(&app, &endpoint, trigger_request(1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "No transport found for sessionId");
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_sse_disconnect_during_tool_call() {
    let gate = Arc::new(Notify::new());
    let (server, stub) = setup_server_with(StubActions::new().gated(gate.clone()));
    let transport = SseTransport::new("127.0.0.1:0".parse().unwrap());
    let app = transport.router(server);
    let (body, endpoint) = open_session(&app).await;

    let (status, _) = post(&app, &endpoint, trigger_request(1)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_until("the call to reach the platform", || stub.call_count() == 1).await;

    drop(body);
    assert!(transport.sessions().is_empty());

    gate.notify_one();
    drop(app);
    drop(transport);

    // The worker holds the last other reference to the stub until it exits.
    wait_until("the session worker to exit", || Arc::strong_count(&stub) == 1).await;
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn test_health() {
    let (_transport, app, _) = setup_sse();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
