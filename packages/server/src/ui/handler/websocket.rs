//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ParticipantId, RequiredCount, RoomKey},
    ui::state::AppState,
    usecase::ConnectError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Required submissions per round, used only when the room is created
    pub required: Option<usize>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path((room_key_str, participant_id_str)): Path<(String, String)>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let room_key = RoomKey::try_from(room_key_str).map_err(|e| {
        tracing::warn!("Invalid room key: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let participant_id = ParticipantId::try_from(participant_id_str).map_err(|e| {
        tracing::warn!("Invalid participant id: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let required_count = query
        .required
        .map(RequiredCount::new)
        .transpose()
        .map_err(|e| {
            tracing::warn!("Invalid required count: {}", e);
            StatusCode::BAD_REQUEST
        })?;

    // Create a channel for this participant to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // 接続はアップグレード前に登録する（重複 ID を 409 で拒否するため）
    // 最初のロスターはチャンネルに溜まり、アップグレード後に送信される
    let connection_id = match state
        .session_manager
        .connect(tx, room_key.clone(), participant_id.clone(), required_count)
        .await
    {
        Ok(connection_id) => connection_id,
        Err(ConnectError::DuplicateParticipantId(id)) => {
            tracing::warn!(
                "Participant '{}' is already connected to room '{}'. Rejecting connection.",
                id,
                room_key
            );
            return Err(StatusCode::CONFLICT);
        }
    };

    let failed_state = state.clone();
    let failed_room_key = room_key.clone();
    let failed_participant_id = participant_id.clone();

    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!(
                "WebSocket upgrade failed for '{}' in room '{}': {}",
                failed_participant_id,
                failed_room_key,
                e
            );
            tokio::spawn(async move {
                failed_state
                    .session_manager
                    .disconnect_connection(&failed_room_key, &failed_participant_id, connection_id)
                    .await;
            });
        })
        .on_upgrade(move |socket| {
            handle_socket(socket, state, room_key, participant_id, connection_id, rx)
        }))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the channel is closed, which happens when the participant
/// is removed from its room or replaced by a newer connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_key: RoomKey,
    participant_id: ParticipantId,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let room_key_clone = room_key.clone();
    let participant_id_clone = participant_id.clone();

    // Spawn a task to receive events from this participant
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", participant_id_clone, text);
                    if let Err(e) = state_clone
                        .session_manager
                        .handle_message(&room_key_clone, &participant_id_clone, text.as_str())
                        .await
                    {
                        tracing::debug!("Event not applied: {}", e);
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Participant '{}' requested close", participant_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push room events to this participant
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let outcome = state
        .session_manager
        .disconnect_connection(&room_key, &participant_id, connection_id)
        .await;
    tracing::debug!(
        "Connection {} of '{}' closed: {:?}",
        connection_id,
        participant_id,
        outcome
    );
}
