//! Notification WebSocket
//!
//! One socket per browser tab. Outgoing messages come from the hub channel
//! registered for the connection; incoming client messages act on the
//! user's notifications directly.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use vidflow_common::db::{init::get_setting_i64, notifications};
use vidflow_common::events::{ClientMessage, ServerMessage};

use super::{ApiError, CurrentUser};
use crate::notify::{self, ConnectionId};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub user_id: Option<i64>,
}

/// GET /api/ws/notifications?userId=N
pub async fn notifications_ws(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::bad_request("userId es requerido"))?;
    if user_id != user.id {
        return Err(ApiError::forbidden("userId no coincide con la sesión"));
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();
    let (connection, mut outgoing) = state.hub.register(user_id).await;

    let limit = get_setting_i64(&state.db, "notification_list_limit", 50)
        .await
        .unwrap_or(50);
    match notify::unread_message(&state.db, user_id, limit).await {
        Ok(Some(unread)) => {
            state.hub.send_to(user_id, connection, unread).await;
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to load unread notifications for user {}: {}", user_id, e),
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize notification message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    recv_state.hub.touch(user_id, connection).await;
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => handle_client_message(&recv_state, user_id, connection, message).await,
                        Err(e) => debug!("Ignoring malformed client message: {}", e),
                    }
                }
                Ok(Message::Pong(_)) | Ok(Message::Ping(_)) => {
                    recv_state.hub.touch(user_id, connection).await;
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => {}
                Err(e) => {
                    debug!("WebSocket error for user {}: {}", user_id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unregister(user_id, connection).await;
}

async fn handle_client_message(
    state: &AppState,
    user_id: i64,
    connection: ConnectionId,
    message: ClientMessage,
) {
    let result = match message {
        ClientMessage::MarkRead { notification_id } => {
            notifications::mark_read(&state.db, user_id, notification_id).await.map(|_| ())
        }
        ClientMessage::MarkAllRead => notifications::mark_all_read(&state.db, user_id).await.map(|_| ()),
        ClientMessage::Archive { notification_id } => {
            notifications::archive(&state.db, user_id, notification_id).await.map(|_| ())
        }
        ClientMessage::Pong => Ok(()),
        ClientMessage::PingClient => {
            let pong = ServerMessage::PongServer { timestamp: Utc::now() };
            state.hub.send_to(user_id, connection, pong).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!("Notification update over WebSocket failed for user {}: {}", user_id, e);
    }
}
