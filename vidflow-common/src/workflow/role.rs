//! User roles
//!
//! Every user holds exactly one role. The role decides which statuses a
//! user sees, how those statuses are labelled, and which transitions the
//! user may request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Closed set of user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Youtuber,
    Reviewer,
    Optimizer,
    ContentReviewer,
    MediaReviewer,
}

impl Role {
    /// All roles in declaration order
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Youtuber,
        Role::Reviewer,
        Role::Optimizer,
        Role::ContentReviewer,
        Role::MediaReviewer,
    ];

    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Youtuber => "youtuber",
            Role::Reviewer => "reviewer",
            Role::Optimizer => "optimizer",
            Role::ContentReviewer => "content_reviewer",
            Role::MediaReviewer => "media_reviewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown role: {}", s)))
    }
}
