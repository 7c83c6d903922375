//! arcon-rv library - Review module
//!
//! Hosts operator edit sessions over HTTP and forwards validated retry
//! requests to the reprocessing backend.

use arcon_common::EditSession;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod api;
pub mod backend;
pub mod error;

use backend::BackendClient;

/// Largest accepted request body (artifact sections plus history)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Open edit sessions by id
pub type SessionMap = Arc<RwLock<HashMap<Uuid, EditSession>>>;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionMap,
    pub backend: Arc<BackendClient>,
    /// Priority flag used when a submit request does not specify one
    pub default_priority: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(backend: BackendClient, default_priority: bool) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend: Arc::new(backend),
            default_priority,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let sessions = Router::new()
        .route("/api/sessions", post(api::open_session))
        .route(
            "/api/sessions/:id",
            get(api::get_session).delete(api::close_session),
        )
        .route(
            "/api/sessions/:id/overrides",
            put(api::set_override).delete(api::remove_override),
        )
        .route("/api/sessions/:id/regen", post(api::toggle_regen))
        .route(
            "/api/sessions/:id/sections/:section_id/remake",
            post(api::toggle_remake_all),
        )
        .route("/api/sessions/:id/entries", get(api::get_entry))
        .route("/api/sessions/:id/clips/:audio_n", get(api::resolve_clip))
        .route("/api/sessions/:id/history/latest", get(api::latest_history))
        .route(
            "/api/sessions/:id/history/first-attempts",
            get(api::first_attempt_history),
        )
        .route("/api/sessions/:id/validate", get(api::validate_session))
        .route(
            "/api/sessions/:id/view/:section_name",
            get(api::get_view_state).put(api::put_view_state),
        )
        .route("/api/sessions/:id/submit", post(api::submit_session));

    let proxy = Router::new().route("/api/update", post(api::proxy_update));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(sessions)
        .merge(proxy)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
