//! Notifications and per-user delivery settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(NotificationKind::Info),
            "success" => Ok(NotificationKind::Success),
            "warning" => Ok(NotificationKind::Warning),
            "error" => Ok(NotificationKind::Error),
            "system" => Ok(NotificationKind::System),
            other => Err(Error::InvalidInput(format!("Unknown notification type: {}", other))),
        }
    }
}

/// Stored notification joined with its sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub is_archived: bool,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub sender_name: Option<String>,
    pub sender_username: Option<String>,
}

/// Fields needed to create a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub action_label: Option<String>,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<i64>,
}

/// Per-user delivery toggles, every channel enabled by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub in_app_enabled: bool,
    pub content_changes_enabled: bool,
    pub assignments_enabled: bool,
    pub mentions_enabled: bool,
    pub status_changes_enabled: bool,
    pub system_messages_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: true,
            in_app_enabled: true,
            content_changes_enabled: true,
            assignments_enabled: true,
            mentions_enabled: true,
            status_changes_enabled: true,
            system_messages_enabled: true,
        }
    }
}
