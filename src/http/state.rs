use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::Auth;
use crate::enrich::Enricher;
use crate::http::library::LibraryProxy;
use crate::queue::QueueController;

/// Shared application state injected into all route handlers via axum::extract::State.
/// Everything behind it is cheap to clone; the queue itself lives in the controller's
/// `Arc<QueueStore>`.
#[derive(Clone)]
pub struct AppState {
    pub queue: QueueController,
    pub enricher: Arc<Enricher>,
    pub auth: Arc<Auth>,
    /// Read the caller from X-Forwarded-For (reverse proxy deployments only).
    pub trust_proxy: bool,
    pub library: Option<LibraryProxy>,
    /// Web UI directory served for every path the API does not claim.
    pub public_dir: Option<PathBuf>,
}
