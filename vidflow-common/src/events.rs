//! Notification channel messages
//!
//! JSON envelopes exchanged over the notification WebSocket, tagged by
//! `type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Notification;

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Pushed as soon as a notification is created for the user
    NewNotification { data: Notification },
    /// Sent once on connect when unread notifications exist
    UnreadNotifications { data: Vec<Notification> },
    /// Server heartbeat; clients answer with `pong`
    Ping,
    /// Answer to a client `ping_client`
    PongServer { timestamp: DateTime<Utc> },
}

/// Client → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    MarkRead {
        #[serde(rename = "notificationId")]
        notification_id: i64,
    },
    MarkAllRead,
    Archive {
        #[serde(rename = "notificationId")]
        notification_id: i64,
    },
    Pong,
    PingClient,
}
