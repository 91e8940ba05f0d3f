//! Live reload channel and WebSocket endpoint

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use super::ServerState;

/// Live reload message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Full page reload required
    FullReload {
        reason: String,
    },

    /// Stylesheet rebuilt (can be swapped in place)
    CssUpdate {
        path: String,
    },

    /// Error during compilation
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
}

/// Broadcast channel shared by the watcher and every connected browser
///
/// The last error is kept until a successful rebuild so a page opened
/// after the failure still shows it.
#[derive(Clone)]
pub struct ReloadChannel {
    tx: broadcast::Sender<ReloadMessage>,
    pending_error: Arc<RwLock<Option<ReloadMessage>>>,
}

impl ReloadChannel {
    /// Create a new channel
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self {
            tx,
            pending_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to future messages
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Send a message to every connected client
    pub fn send(&self, message: ReloadMessage) {
        *self.pending_error.write() = match &message {
            ReloadMessage::Error { .. } => Some(message.clone()),
            _ => None,
        };

        // No receivers just means no browser is open
        let _ = self.tx.send(message);
    }

    /// The error a newly connected client should see, if any
    pub fn pending_error(&self) -> Option<ReloadMessage> {
        self.pending_error.read().clone()
    }
}

impl Default for ReloadChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle WebSocket upgrade for live reload
pub async fn reload_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_reload_socket(socket, state))
}

/// Handle a live reload WebSocket connection
async fn handle_reload_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut reload_rx = state.reload.subscribe();

    let mut greeting = vec![ReloadMessage::Connected];
    greeting.extend(state.reload.pending_error());
    for message in greeting {
        if let Ok(json) = serde_json::to_string(&message) {
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
    }

    debug!("Live reload client connected");

    // Forward reload messages to the client
    let send_task = tokio::spawn(async move {
        loop {
            let message = match reload_rx.recv().await {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Live reload client lagged by {} message(s)", skipped);
                    ReloadMessage::FullReload {
                        reason: "missed updates".to_string(),
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Drain the client side until it closes
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                debug!("Live reload client disconnected");
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    debug!("Live reload connection closed");
}
