pub mod api;
pub mod caller;
pub mod error;
pub mod library;
pub mod session;
pub mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Queue API: behind the login gate when login is required.
    let gated = Router::new()
        .route("/api/status", get(api::status))
        .route("/api/add", post(api::add))
        .route("/api/next", post(api::next))
        .route("/api/delete", post(api::delete))
        .route("/api/queue", get(api::queue))
        .route("/api/library/{*path}", get(library::proxy))
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_session));

    let mut router = Router::new()
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route("/api/auth-status", get(session::auth_status))
        .merge(gated);

    if let Some(dir) = &state.public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
