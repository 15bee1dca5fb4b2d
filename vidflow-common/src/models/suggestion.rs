//! User suggestions reviewed by admins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Reviewed,
    Implemented,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Reviewed => "reviewed",
            SuggestionStatus::Implemented => "implemented",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for SuggestionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SuggestionStatus::Pending),
            "reviewed" => Ok(SuggestionStatus::Reviewed),
            "implemented" => Ok(SuggestionStatus::Implemented),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown suggestion status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: SuggestionStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: Option<String>,
}

/// Categories offered to users when filing a suggestion
pub const SUGGESTION_CATEGORIES: [&str; 6] = [
    "general",
    "interfaz",
    "funcionalidad",
    "rendimiento",
    "bug",
    "optimización",
];

/// Validated input for a new suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSuggestion {
    pub title: String,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    SUGGESTION_CATEGORIES[0].to_string()
}

impl NewSuggestion {
    pub fn validate(&self) -> crate::Result<()> {
        let title_len = self.title.trim().chars().count();
        if !(3..=255).contains(&title_len) {
            return Err(Error::InvalidInput(
                "El título debe tener entre 3 y 255 caracteres".to_string(),
            ));
        }
        if self.description.trim().chars().count() < 10 {
            return Err(Error::InvalidInput(
                "La descripción debe tener al menos 10 caracteres".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidInput("La categoría es requerida".to_string()));
        }
        Ok(())
    }
}
