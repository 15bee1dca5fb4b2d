//! HTTP error mapping
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{success: false, message, details?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};
use vidflow_common::workflow::allowed_transitions;
use vidflow_common::Error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Rejected status change, with the allowed alternatives in `details`
    InvalidTransition { message: String, details: Value },
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// YouTube or analysis service failure
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::InvalidTransition { role, from, to } => {
                let allowed: Vec<&str> = allowed_transitions(role, from)
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                ApiError::InvalidTransition {
                    message: format!(
                        "Transición de estado no permitida: {} → {}",
                        from.label(),
                        to.label()
                    ),
                    details: json!({
                        "role": role.as_str(),
                        "from": from.as_str(),
                        "to": to.as_str(),
                        "allowed": allowed,
                    }),
                }
            }
            Error::External(msg) => ApiError::Upstream(msg),
            Error::Csv(e) => ApiError::BadRequest(format!("CSV inválido: {}", e)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(Error::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                ("Error interno del servidor".to_string(), None)
            }
            ApiError::Upstream(detail) => {
                warn!("Upstream service error: {}", detail);
                ("Error en el servicio externo".to_string(), Some(json!(detail)))
            }
            ApiError::InvalidTransition { message, details } => (message, Some(details)),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => (msg, None),
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
