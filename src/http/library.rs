use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use url::Url;

use crate::http::error::ApiError;
use crate::http::state::AppState;

pub const LIBRARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Pass-through to a self-hosted media library (covers, streams, item lookups)
/// so browsers on the LAN only ever talk to this server.
///
/// Only paths under the configured base URL are reachable.
#[derive(Debug, Clone)]
pub struct LibraryProxy {
    base: String,
    client: Client,
}

impl LibraryProxy {
    pub fn new(base: impl Into<String>, client: Client) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn with_default_client(base: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(LIBRARY_TIMEOUT).build()?;
        Ok(Self::new(base, client))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Upstream URL for `path` (relative to the base) and an optional raw query.
    /// `None` when the path tries to climb out of the base, in any spelling a URL
    /// parser would still treat as a dot segment.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Option<String> {
        let path = path.trim_start_matches('/');
        if path.split(['/', '\\']).any(is_dot_segment) {
            return None;
        }
        let mut joined = format!("{}/{}", self.base, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            joined.push('?');
            joined.push_str(query);
        }

        let base = Url::parse(&self.base).ok()?;
        let url = Url::parse(&joined).ok()?;
        let base_path = base.path().trim_end_matches('/');
        let inside = url.path() == base_path || url.path().starts_with(&format!("{base_path}/"));
        if url.origin() != base.origin() || !inside {
            return None;
        }
        Some(url.into())
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// GET /api/library/{*path}
pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let library = state
        .library
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No media library configured".to_string()))?;
    let url = library
        .upstream_url(&path, query.as_deref())
        .ok_or_else(|| ApiError::Validation("Invalid library path".to_string()))?;

    let upstream = library.client.get(&url).send().await.map_err(|e| {
        tracing::warn!("Library request to {} failed: {}", url, e);
        ApiError::BadGateway("Media library unreachable".to_string())
    })?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok());
    let body = upstream.bytes().await.map_err(|e| {
        tracing::warn!("Library response from {} broke off: {}", url, e);
        ApiError::BadGateway("Media library response incomplete".to_string())
    })?;

    let mut response = (status, body).into_response();
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}
