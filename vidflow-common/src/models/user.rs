//! Users and the actor performing a request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::Role;

/// Stored user, without credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub max_assigned_videos: Option<i64>,
    pub max_monthly_videos: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    /// Name shown to other users
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// The authenticated user a workflow operation runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Per-user production limits with current usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLimits {
    pub current_assigned_count: i64,
    pub max_assigned_allowed: i64,
    pub current_monthly_count: i64,
    pub monthly_limit: i64,
    pub can_take_more: bool,
    pub reached_monthly_limit: bool,
}

/// Defaults applied when a user has no explicit limit
pub const DEFAULT_MAX_ASSIGNED_VIDEOS: i64 = 3;
pub const DEFAULT_MAX_MONTHLY_VIDEOS: i64 = 30;

impl VideoLimits {
    pub fn compute(user: &User, current_assigned_count: i64, current_monthly_count: i64) -> Self {
        let max_assigned_allowed = user.max_assigned_videos.unwrap_or(DEFAULT_MAX_ASSIGNED_VIDEOS);
        let monthly_limit = user.max_monthly_videos.unwrap_or(DEFAULT_MAX_MONTHLY_VIDEOS);
        let reached_monthly_limit = current_monthly_count >= monthly_limit;
        Self {
            current_assigned_count,
            max_assigned_allowed,
            current_monthly_count,
            monthly_limit,
            can_take_more: current_assigned_count < max_assigned_allowed && !reached_monthly_limit,
            reached_monthly_limit,
        }
    }
}
