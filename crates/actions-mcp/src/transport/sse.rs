//! SSE Transport
//!
//! Many concurrent sessions over HTTP. A client opens `GET /sse`, receives
//! an `endpoint` event naming its private POST target, then sends JSON-RPC
//! requests to `POST /messages?sessionId=...`. Responses come back on the
//! event stream as `message` events.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::session::{SessionId, SessionTable};
use crate::server::ActionsMcpServer;
use crate::{Error, Result};

/// Pending requests a session may queue before POSTs start waiting.
const INBOUND_CAPACITY: usize = 32;
/// Responses buffered for a slow event-stream reader.
const OUTBOUND_CAPACITY: usize = 32;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Multiplexed HTTP transport with Server-Sent Events responses.
#[derive(Debug, Clone)]
pub struct SseTransport {
    addr: SocketAddr,
    sessions: SessionTable,
}

#[derive(Clone)]
struct SseState {
    server: ActionsMcpServer,
    sessions: SessionTable,
}

impl SseTransport {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            sessions: SessionTable::new(),
        }
    }

    /// Live sessions of this transport.
    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Create the Axum router for the transport.
    pub fn router(&self, server: ActionsMcpServer) -> Router {
        let state = SseState {
            server,
            sessions: self.sessions.clone(),
        };

        Router::new()
            .route("/sse", get(sse_handler))
            .route("/messages", post(message_handler))
            .route("/health", get(health_handler))
            .with_state(state)
    }

    /// Bind and serve until the listener fails.
    pub async fn serve(self, server: ActionsMcpServer) -> Result<()> {
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind {}: {}", self.addr, e)))?;
        tracing::info!(addr = %self.addr, "SSE transport listening");

        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Event stream of one session; unregisters the session when dropped.
struct SessionStream {
    events: Pin<Box<dyn Stream<Item = std::result::Result<Event, Infallible>> + Send>>,
    sessions: SessionTable,
    id: SessionId,
}

impl Stream for SessionStream {
    type Item = std::result::Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        if self.sessions.remove(&self.id) {
            tracing::info!(session_id = %self.id, "SSE client disconnected");
        }
    }
}

/// SSE endpoint - opens a session and streams its responses
async fn sse_handler(State(state): State<SseState>) -> impl IntoResponse {
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    let id = state.sessions.open(inbound_tx);
    tracing::info!(session_id = %id, "SSE client connected");

    tokio::spawn(run_session(
        state.server.clone(),
        id.clone(),
        inbound_rx,
        outbound_tx,
    ));

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?sessionId={}", id));
    let messages = ReceiverStream::new(outbound_rx)
        .map(|json| Ok::<_, Infallible>(Event::default().event("message").data(json)));

    let stream = SessionStream {
        events: stream::once(async move { Ok::<_, Infallible>(endpoint) })
            .chain(messages)
            .boxed(),
        sessions: state.sessions.clone(),
        id,
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

/// Drain one session's inbound queue in arrival order.
///
/// Stops as soon as the event stream is gone; requests still queued at that
/// point are never dispatched.
async fn run_session(
    server: ActionsMcpServer,
    id: SessionId,
    mut inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<String>,
) {
    while let Some(message) = inbound.recv().await {
        if outbound.is_closed() {
            tracing::debug!(session_id = %id, "Session closed, dropping queued request");
            break;
        }
        let Some(response) = server.respond(&message).await else {
            continue;
        };
        if outbound.send(response).await.is_err() {
            tracing::debug!(session_id = %id, "Session stream gone, discarding response");
        }
    }
    tracing::debug!(session_id = %id, "Session worker finished");
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Message endpoint - clients POST JSON-RPC requests here
async fn message_handler(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId query parameter".to_string());
    };
    let id = SessionId::from(raw_id.as_str());

    let Some(inbound) = state.sessions.lookup(&id) else {
        tracing::warn!(session_id = %id, "Message for unknown session");
        return (StatusCode::BAD_REQUEST, "No transport found for sessionId".to_string());
    };

    if let Err(e) = serde_json::from_str::<Value>(&body) {
        tracing::debug!(session_id = %id, error = %e, "Rejected invalid JSON body");
        return (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e));
    }

    if inbound.send(body).await.is_err() {
        return (StatusCode::BAD_REQUEST, "No transport found for sessionId".to_string());
    }

    (StatusCode::ACCEPTED, "Accepted".to_string())
}

async fn health_handler() -> &'static str {
    "ok"
}
