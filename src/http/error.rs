use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::AuthError;
use crate::queue::{HostAction, QueueError};

/// Everything a handler can fail with, mapped onto the wire format the web UI expects:
/// `{success: false, message}` for bad input, `{message}` for 401/403.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid index")]
    InvalidIndex(#[source] QueueError),
    #[error("Invalid index")]
    MissingIndex,
    #[error("{}", not_host_message(.0))]
    NotHost(HostAction),
    #[error("Authentication required")]
    Unauthenticated,
    #[error(transparent)]
    Auth(AuthError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    Internal(String),
}

fn not_host_message(action: &HostAction) -> &'static str {
    match action {
        HostAction::Advance => "Only the host machine can control playback.",
        HostAction::Delete => "Only the host machine can delete videos.",
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotHost(action) => ApiError::NotHost(action),
            other => ApiError::InvalidIndex(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidIndex(_) | ApiError::MissingIndex => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotHost(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = match &self {
            ApiError::NotHost(_) | ApiError::Unauthenticated => json!({ "message": message }),
            ApiError::InvalidIndex(reason) => json!({
                "success": false,
                "message": message,
                "reason": reason.to_string(),
            }),
            ApiError::MissingIndex => json!({
                "success": false,
                "message": message,
                "reason": "index must be an integer",
            }),
            _ => json!({ "success": false, "message": message }),
        };
        if status.is_server_error() {
            tracing::error!("{}", message);
        }
        (status, Json(body)).into_response()
    }
}
