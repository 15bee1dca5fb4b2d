//! Projects and series numbering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub prefix: Option<String>,
    pub current_number: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Series number for the `number`-th video of a project
///
/// Four-digit zero padding, prefixed with `PREFIX-` when the project has a
/// non-empty prefix.
pub fn format_series_number(prefix: Option<&str>, number: i64) -> String {
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}-{:04}", prefix, number),
        None => format!("{:04}", number),
    }
}
