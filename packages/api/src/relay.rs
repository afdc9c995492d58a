use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use shared::models::game::normalize_game_code;

use crate::state::AppState;

pub type ConnectionId = Uuid;

/// Maps game codes to the live connections watching them. Holds no game
/// state and is never a source of truth: notifications are wake-up signals
/// that tell peers to re-fetch from the session store.
///
/// One registry exists per server process, created in `main` and injected
/// through the router state; rooms are transient and die with the process.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, HashMap<ConnectionId, mpsc::UnboundedSender<String>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Associate a connection with a game's room. Idempotent, so clients can
    /// re-join after a reconnect without checking.
    pub async fn join_room(
        &self,
        game_code: &str,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
    ) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(normalize_game_code(game_code))
            .or_default()
            .insert(connection_id, sender);
    }

    /// Drop a connection from every room it joined. Driven by socket close.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let mut rooms = self.rooms.lock().await;
        for members in rooms.values_mut() {
            members.remove(&connection_id);
        }
        rooms.retain(|_, members| !members.is_empty());
    }

    /// Best-effort fan-out to every room member except the originator.
    /// Missing rooms, empty rooms, and dead peers are silently skipped;
    /// delivery is fire-and-forget and never blocks the caller. Returns how
    /// many peers the payload was handed to.
    pub async fn notify(
        &self,
        game_code: &str,
        origin: Option<ConnectionId>,
        payload: &str,
    ) -> usize {
        let rooms = self.rooms.lock().await;
        let members = match rooms.get(&normalize_game_code(game_code)) {
            Some(members) => members,
            None => return 0,
        };

        let mut delivered = 0;
        for (connection_id, sender) in members {
            if Some(*connection_id) == origin {
                continue;
            }
            if sender.send(payload.to_string()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn room_size(&self, game_code: &str) -> usize {
        let rooms = self.rooms.lock().await;
        rooms
            .get(&normalize_game_code(game_code))
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ClientFrame {
    action: String,
    #[serde(default)]
    game_code: Option<String>,
    #[serde(default, rename = "move")]
    move_payload: Option<serde_json::Value>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!("WebSocket connection established: {}", connection_id);

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    // Single writer per socket; room notifications queue through the channel.
    let forward = tokio::spawn(async move {
        while let Some(payload) = receiver.recv().await {
            if ws_tx.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(&state, connection_id, &sender, &text).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.rooms.disconnect(connection_id).await;
    forward.abort();
    info!("WebSocket connection closed: {}", connection_id);
}

async fn handle_frame(
    state: &AppState,
    connection_id: ConnectionId,
    sender: &mpsc::UnboundedSender<String>,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Dropping unparseable frame from {}: {}", connection_id, e);
            let _ = sender.send(
                json!({"action": "error", "message": "Invalid JSON format"}).to_string(),
            );
            return;
        }
    };

    match frame.action.as_str() {
        "join-room" => match frame.game_code {
            Some(game_code) => {
                debug!("Connection {} joining room {}", connection_id, game_code);
                state
                    .rooms
                    .join_room(&game_code, connection_id, sender.clone())
                    .await;
            }
            None => {
                let _ = sender.send(
                    json!({"action": "error", "message": "join-room requires game_code"})
                        .to_string(),
                );
            }
        },
        // Advisory only: receivers re-fetch authoritative state instead of
        // applying this payload.
        "move" => match (frame.game_code, frame.move_payload) {
            (Some(game_code), Some(move_payload)) => {
                let rebroadcast = json!({
                    "action": "move",
                    "game_code": game_code,
                    "move": move_payload,
                })
                .to_string();
                let delivered = state
                    .rooms
                    .notify(&game_code, Some(connection_id), &rebroadcast)
                    .await;
                debug!(
                    "Relayed move in {} to {} peer(s) from {}",
                    game_code, delivered, connection_id
                );
            }
            _ => {
                let _ = sender.send(
                    json!({"action": "error", "message": "move requires game_code and move"})
                        .to_string(),
                );
            }
        },
        other => {
            debug!("Unknown action from {}: {}", connection_id, other);
            let _ = sender.send(
                json!({"action": "error", "message": format!("Unknown action: {}", other)})
                    .to_string(),
            );
        }
    }
}
