//! Database schema and repositories

pub mod affiliates;
pub mod init;
pub mod migrations;
pub mod notifications;
pub mod projects;
pub mod sessions;
pub mod suggestions;
pub mod titulin;
pub mod users;
pub mod videos;

pub use init::*;
pub use migrations::*;

use serde::de::DeserializeOwned;

use crate::Error;

/// Map a unique-constraint violation to [`Error::Conflict`]
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => Error::Database(err),
    }
}

/// Decode a JSON TEXT column, treating NULL and blank as the default value
pub(crate) fn json_column<T>(raw: Option<String>) -> crate::Result<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
        _ => Ok(T::default()),
    }
}
