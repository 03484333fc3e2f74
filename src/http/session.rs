use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{session_token, AuthError};
use crate::http::api::parse_body;
use crate::http::error::ApiError;
use crate::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Gate for the queue API when login is required.
pub async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.allows(request.headers()) {
        next.run(request).await
    } else {
        ApiError::Unauthenticated.into_response()
    }
}

/// POST /api/login
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    if !state.auth.login_required() {
        return Err(AuthError::Disabled.into());
    }
    let request: LoginRequest = parse_body(&body)?;
    let auth = state.auth.clone();
    let token = tokio::task::spawn_blocking(move || auth.login(&request.username, &request.password))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))??;
    Ok((
        [(header::SET_COOKIE, state.auth.session_cookie(&token))],
        Json(json!({ "success": true, "message": "Login successful" })),
    )
        .into_response())
}

/// POST /api/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = session_token(&headers).and_then(|token| state.auth.logout(&token));
    let message = if user.is_some() {
        "Logged out successfully"
    } else {
        "Already logged out"
    };
    (
        [(header::SET_COOKIE, state.auth.expired_cookie())],
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// GET /api/auth-status
pub async fn auth_status(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "requireLogin": state.auth.login_required(),
        "authenticated": state.auth.is_authenticated(&headers),
    }))
}
