//! Dashboard refresh hub
//!
//! WebSocket endpoint that lets connected dashboards join and leave named
//! refresh groups. The server only pushes `refresh` hints into groups;
//! clients re-poll the REST API for data. Group membership is a broadcast
//! channel per group name held in a concurrent map.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Group used for application-log refresh hints.
pub const LOGS_GROUP: &str = "logs";

/// Group used for audit refresh hints.
pub const AUDIT_GROUP: &str = "audit";

const GROUP_CHANNEL_CAPACITY: usize = 256;
const MAX_GROUP_NAME_LENGTH: usize = 64;

/// Message sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientMessage {
    Join { group: String },
    Leave { group: String },
}

/// Message sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum HubMessage {
    Joined { group: String },
    Left { group: String },
    Refresh { group: String },
    Error { message: String },
}

/// Shared hub state: one broadcast channel per refresh group
#[derive(Clone, Default)]
pub struct HubState {
    groups: Arc<DashMap<String, broadcast::Sender<HubMessage>>>,
}

impl HubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the broadcast sender for a group
    fn group_tx(&self, group: &str) -> broadcast::Sender<HubMessage> {
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| broadcast::channel(GROUP_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Push a refresh hint into a group. Returns the number of receivers.
    pub fn notify(&self, group: &str) -> usize {
        match self.groups.get(group) {
            Some(tx) => tx
                .send(HubMessage::Refresh {
                    group: group.to_string(),
                })
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Remove groups that have no active subscribers.
    pub fn cleanup_empty_groups(&self) {
        self.groups.retain(|_, tx| tx.receiver_count() > 0);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Upgrade handler for `GET /hub/log-analytics`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<HubState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: HubState) {
    let (mut sender, mut receiver) = socket.split();
    let (client_tx, mut client_rx) = tokio::sync::mpsc::channel::<HubMessage>(64);

    // Forward server messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                },
                Err(e) => {
                    warn!("Failed to serialize hub message: {e}");
                },
            }
        }
    });

    // One forwarding task per joined group
    let mut joined: HashMap<String, tokio::task::JoinHandle<()>> = HashMap::new();

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };

        let parsed: Result<ClientMessage, _> = serde_json::from_str(&text);
        match parsed {
            Ok(ClientMessage::Join { group }) => {
                if group.is_empty() || group.len() > MAX_GROUP_NAME_LENGTH {
                    let _ = client_tx
                        .send(HubMessage::Error {
                            message: "invalid group name".to_string(),
                        })
                        .await;
                    continue;
                }
                if joined.contains_key(&group) {
                    continue;
                }

                let mut group_rx = state.group_tx(&group).subscribe();
                let forward_tx = client_tx.clone();
                let handle = tokio::spawn(async move {
                    while let Ok(msg) = group_rx.recv().await {
                        if forward_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                });

                joined.insert(group.clone(), handle);
                debug!(group = %group, "Hub client joined group");
                let _ = client_tx.send(HubMessage::Joined { group }).await;
            },
            Ok(ClientMessage::Leave { group }) => {
                if let Some(handle) = joined.remove(&group) {
                    handle.abort();
                    debug!(group = %group, "Hub client left group");
                    let _ = client_tx.send(HubMessage::Left { group }).await;
                }
            },
            Err(_) => {
                let _ = client_tx
                    .send(HubMessage::Error {
                        message: "unrecognized message".to_string(),
                    })
                    .await;
            },
        }
    }

    // Socket closed: stop all forwarders and release empty groups
    for (_, handle) in joined.drain() {
        handle.abort();
    }
    drop(client_tx);
    let _ = send_task.await;
    state.cleanup_empty_groups();
}
