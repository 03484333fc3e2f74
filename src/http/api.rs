use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::enrich::{extract_video_id, is_video_link};
use crate::http::caller::Caller;
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::queue::{HostAction, ItemKind, QueueError, QueueItem};

// ── Request bodies ────────────────────────────────────────────────────────────

/// Body of `POST /api/add`. A bare `{videoUrl}` is a video link; library tracks
/// say so with `kind: "library-track"` and carry their own metadata.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddRequest {
    video_url: Option<String>,
    kind: Option<ItemKind>,
    external_id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    cover_reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteRequest {
    index: Option<Value>,
}

/// Parse a JSON body; an empty body is the all-defaults request.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))
}

/// Index as the web UI may send it: a JSON number or a numeric string.
/// Integral floats (`1.0`) count; values beyond `i64` saturate so they report as
/// out of range rather than malformed.
pub(crate) fn parse_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    // `as` saturates at the i64 bounds.
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/status: tells the UI whether to run in host or guest mode.
pub async fn status(State(state): State<AppState>, Caller(caller): Caller) -> Json<Value> {
    Json(json!({
        "isHost": state.queue.is_host(caller),
        "yourIp": caller.to_string(),
    }))
}

/// POST /api/add: anyone may queue. Title lookup happens before the queue lock
/// is taken and cannot fail the request.
pub async fn add(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request: AddRequest = parse_body(&body)?;

    let (item, message) = match request.kind {
        Some(ItemKind::LibraryTrack) => {
            let external_id = request
                .external_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ApiError::Validation("Library tracks need an externalId".to_string()))?;
            let item = QueueItem::library_track(
                external_id,
                request.title,
                request.artist,
                request.cover_reference,
            );
            (item, "Track added successfully")
        }
        Some(ItemKind::Other) => {
            return Err(ApiError::Validation("Unsupported item kind".to_string()));
        }
        Some(ItemKind::VideoLink) | None => {
            let url = request
                .video_url
                .map(|u| u.trim().to_string())
                .filter(|u| is_video_link(u))
                .ok_or_else(|| ApiError::Validation("Invalid URL - must be a YouTube link".to_string()))?;
            let enrichment = state.enricher.enrich(&url).await;
            let item = QueueItem::video_link(url.as_str(), extract_video_id(&url), enrichment.title);
            let message = if enrichment.enriched {
                "Video added successfully"
            } else {
                "Video added (warning: could not verify if embedding is allowed)"
            };
            (item, message)
        }
    };

    tracing::debug!("Add request from {}", caller);
    let stored = state.queue.enqueue(item);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message, "video": stored })),
    ))
}

/// POST /api/next: host only. `nextVideo: null` once the queue is drained.
pub async fn next(State(state): State<AppState>, Caller(caller): Caller) -> Result<Json<Value>, ApiError> {
    let next = state.queue.advance(caller)?;
    Ok(Json(json!({ "nextVideo": next })))
}

/// POST /api/delete: host only, `index >= 1`.
pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    // Authority outranks body validation: a guest gets 403 whatever it sent.
    let index = parse_body::<DeleteRequest>(&body)
        .ok()
        .and_then(|r| r.index)
        .as_ref()
        .and_then(parse_index);
    let Some(index) = index else {
        if !state.queue.is_host(caller) {
            return Err(QueueError::NotHost(HostAction::Delete).into());
        }
        return Err(ApiError::MissingIndex);
    };

    state.queue.delete(caller, index)?;
    Ok(Json(json!({ "success": true, "message": "Video removed" })))
}

/// GET /api/queue: the one read path, polled by every client.
pub async fn queue(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.queue.snapshot();
    Json(json!({
        "queue": snapshot.items,
        "currentlyPlaying": snapshot.currently_playing,
    }))
}
