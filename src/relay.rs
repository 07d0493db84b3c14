//! Notification relay.
//!
//! Route: GET /ws
//!
//! Clients announce that something changed (`{"type":"new_post"}`) and every
//! open connection, the sender included, receives the same one-field
//! notification as a cue to re-fetch over the REST API. The relay carries no
//! payload and never touches the content store.
//!
//! Inbound frames, text or binary, are read as UTF-8 JSON and checked against
//! a fixed allow-list. Anything else is dropped without a reply and logged at
//! debug.
//!
//! Each connection has a bounded outbound queue. A client that stops reading
//! misses notifications once its queue is full; nothing else is held for it.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::metrics;
use crate::AppState;

// ── Events ────────────────────────────────────────────────────

/// The allow-list of event types the relay forwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelayEvent {
    NewMessage,
    NewPost,
    NewGig,
    NewStartup,
    ApprovalUpdate,
}

impl RelayEvent {
    pub const ALL: [RelayEvent; 5] = [
        RelayEvent::NewMessage,
        RelayEvent::NewPost,
        RelayEvent::NewGig,
        RelayEvent::NewStartup,
        RelayEvent::ApprovalUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayEvent::NewMessage => "new_message",
            RelayEvent::NewPost => "new_post",
            RelayEvent::NewGig => "new_gig",
            RelayEvent::NewStartup => "new_startup",
            RelayEvent::ApprovalUpdate => "approval_update",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == raw)
    }

    /// The outbound frame: `{"type":"<event>"}` and nothing else.
    pub fn to_frame(self) -> String {
        serde_json::json!({ "type": self.as_str() }).to_string()
    }
}

/// Extract an allow-listed event from an inbound text frame.
///
/// Only the `type` field is read; other fields are neither validated nor
/// forwarded.
pub fn parse_inbound(raw: &str) -> Option<RelayEvent> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .as_object()?
        .get("type")?
        .as_str()
        .and_then(RelayEvent::parse)
}

// ── Connection registry ──────────────────────────────────────

/// Frames queued per connection before further notifications are skipped.
pub const OUTBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct Connection {
    state: ConnectionState,
    tx: mpsc::Sender<String>,
}

/// The set of live relay connections.
///
/// Cloneable; all clones share one registry. Registration, removal and
/// broadcast may run concurrently from any connection task.
#[derive(Clone, Default)]
pub struct RelayHub {
    connections: Arc<DashMap<Uuid, Connection>>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection in `Connecting`. Frames broadcast to it arrive on
    /// the returned receiver once it is marked open.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let id = Uuid::new_v4();
        self.connections.insert(
            id,
            Connection {
                state: ConnectionState::Connecting,
                tx,
            },
        );
        (id, rx)
    }

    pub fn mark_open(&self, id: Uuid) {
        if let Some(mut conn) = self.connections.get_mut(&id) {
            conn.state = ConnectionState::Open;
            metrics::RELAY_CONNECTIONS.inc();
            tracing::info!(conn_id = %id, "relay connection opened");
        }
    }

    /// Remove a connection. Safe to call more than once or for an id that
    /// never registered.
    pub fn unregister(&self, id: Uuid) {
        if let Some((_, conn)) = self.connections.remove(&id) {
            if conn.state == ConnectionState::Open {
                metrics::RELAY_CONNECTIONS.dec();
            }
            tracing::info!(conn_id = %id, open = self.connections.len(), "relay connection closed");
        }
    }

    pub fn state(&self, id: Uuid) -> ConnectionState {
        self.connections
            .get(&id)
            .map(|c| c.state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Connections currently in `Open`.
    pub fn open_connections(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| c.state == ConnectionState::Open)
            .count()
    }

    /// Number of registered connections in any state.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send `event` to every open connection. Connections that are not open,
    /// whose queue is full, or whose writer has already gone away are
    /// skipped. Returns the number of connections the frame was queued for.
    pub fn broadcast(&self, event: RelayEvent) -> usize {
        let frame = event.to_frame();
        let mut delivered = 0;
        for conn in self.connections.iter() {
            if conn.state != ConnectionState::Open {
                continue;
            }
            match conn.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    metrics::record_relay_event(event.as_str(), "lagged");
                    tracing::debug!(conn_id = %conn.key(), "relay queue full, notification skipped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Handle one inbound text frame. Returns how many connections the
    /// notification went to, or `None` if the frame was dropped.
    pub fn relay(&self, from: Uuid, raw: &str) -> Option<usize> {
        let Some(event) = parse_inbound(raw) else {
            metrics::record_relay_event("invalid", "dropped");
            tracing::debug!(conn_id = %from, bytes = raw.len(), "relay frame dropped");
            return None;
        };

        let delivered = self.broadcast(event);
        metrics::record_relay_event(event.as_str(), "broadcast");
        tracing::debug!(conn_id = %from, event = event.as_str(), delivered, "relay broadcast");
        Some(delivered)
    }
}

// ── Handler ───────────────────────────────────────────────────

/// GET /ws
///
/// Unauthenticated: the relay carries no data worth protecting.
pub async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    let hub = state.relay.clone();
    ws.on_upgrade(move |socket| serve_connection(hub, socket))
}

async fn serve_connection(hub: RelayHub, socket: WebSocket) {
    let (id, mut outbound) = hub.register();
    let (mut sink, mut stream) = socket.split();
    hub.mark_open(id);

    let writer = async {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    };

    let reader = async {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    hub.relay(id, &text);
                }
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        hub.relay(id, text);
                    }
                    Err(_) => {
                        metrics::record_relay_event("invalid", "dropped");
                        tracing::debug!(conn_id = %id, "non-UTF-8 relay frame dropped");
                    }
                },
                Ok(Message::Close(_)) => break,
                // axum answers pings itself
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    tracing::debug!(conn_id = %id, "relay read error: {}", e);
                    break;
                }
            }
        }
    };

    // Stop when either side ends
    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }

    hub.unregister(id);
}

// ── Tests ─────────────────────────────────────────────────────
