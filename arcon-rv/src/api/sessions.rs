//! Edit session lifecycle and retry-tree edits
//!
//! Every edit computes a new tree from the session's current one and swaps
//! it in under the session-map write lock. Rejected edits answer 422 and
//! leave the session untouched.

use arcon_common::retry::{validator, ClipTarget, CorrectionHistory, RetryData, RetryTextEntry, Section};
use arcon_common::view_state::SectionViewState;
use arcon_common::EditSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Historical correction feed as supplied by the history loader
#[derive(Debug, Default, Deserialize)]
pub struct HistoryPayload {
    /// Error blocks, `[{"toRetry": [...]}, ...]`
    #[serde(default)]
    pub errors: Value,
    /// Manual corrections, `[{"audioN": .., "attempt": ..}, ...]`
    #[serde(default)]
    pub manual: Value,
}

/// POST /api/sessions body
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub task: String,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub history: Option<HistoryPayload>,
}

/// Session summary, including the current retry tree
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub task: String,
    pub opened_at: DateTime<Utc>,
    pub section_count: usize,
    pub clip_count: usize,
    pub retry: RetryData,
    pub valid: bool,
}

impl From<&EditSession> for SessionResponse {
    fn from(session: &EditSession) -> Self {
        Self {
            session_id: session.id(),
            task: session.task().to_string(),
            opened_at: session.opened_at(),
            section_count: session.sections().len(),
            clip_count: arcon_common::retry::total_clips(session.sections()),
            retry: session.retry().clone(),
            valid: validator::is_valid(Some(session.retry())),
        }
    }
}

/// Retry tree after an edit
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub retry: RetryData,
    pub valid: bool,
}

impl RetryResponse {
    fn new(retry: &RetryData) -> Self {
        Self {
            retry: retry.clone(),
            valid: validator::is_valid(Some(retry)),
        }
    }
}

/// PUT /api/sessions/:id/overrides body
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    #[serde(flatten)]
    pub target: ClipTarget,
    #[serde(rename = "newText")]
    pub new_text: Option<String>,
    /// Defaults to the generated text at the target position
    #[serde(rename = "originalText", default)]
    pub original_text: Option<String>,
}

/// GET /api/sessions/:id/entries query
#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub section_id: i64,
    pub index: i64,
    pub audio_id: Option<i64>,
}

impl EntryQuery {
    fn target(&self) -> ClipTarget {
        let target = ClipTarget::new(self.section_id, self.index);
        match self.audio_id {
            Some(id) => target.with_audio_id(id),
            None => target,
        }
    }
}

pub(crate) fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("edit session {}", id))
}

/// POST /api/sessions
pub async fn open_session(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    if request.task.trim().is_empty() {
        return Err(ApiError::BadRequest("task must not be empty".to_string()));
    }

    let mut session = EditSession::new(request.task, request.sections);
    if let Some(history) = request.history {
        let history = CorrectionHistory::from_json(&history.errors, &history.manual)?;
        session = session.with_history(history)?;
    }

    let response = SessionResponse::from(&session);
    info!(
        session_id = %response.session_id,
        task = %response.task,
        sections = response.section_count,
        clips = response.clip_count,
        "Opened edit session"
    );

    state.sessions.write().await.insert(session.id(), session);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(SessionResponse::from(session)))
}

/// DELETE /api/sessions/:id
///
/// Discards the session and its unsubmitted retry tree.
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = state.sessions.write().await.remove(&id);
    match removed {
        Some(session) => {
            info!(session_id = %id, task = session.task(), "Discarded edit session");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(id)),
    }
}

/// PUT /api/sessions/:id/overrides
pub async fn set_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<Json<RetryResponse>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;

    let retry = session.set_override_text(
        &request.target,
        request.new_text.as_deref(),
        request.original_text.as_deref(),
    )?;
    Ok(Json(RetryResponse::new(retry)))
}

/// DELETE /api/sessions/:id/overrides
pub async fn remove_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(target): Json<ClipTarget>,
) -> ApiResult<Json<RetryResponse>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(RetryResponse::new(session.remove_override(&target))))
}

/// POST /api/sessions/:id/regen
pub async fn toggle_regen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(target): Json<ClipTarget>,
) -> ApiResult<Json<RetryResponse>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    let retry = session.toggle_regenerate(&target)?;
    Ok(Json(RetryResponse::new(retry)))
}

/// POST /api/sessions/:id/sections/:section_id/remake
pub async fn toggle_remake_all(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, i64)>,
) -> ApiResult<Json<RetryResponse>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(RetryResponse::new(session.toggle_section_remake_all(section_id))))
}

/// GET /api/sessions/:id/entries?section_id=..&index=..[&audio_id=..]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<EntryQuery>,
) -> ApiResult<Json<RetryTextEntry>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    let entry = session.entry_state(&query.target()).cloned().ok_or_else(|| {
        ApiError::NotFound(format!(
            "no override for section {} clip {}",
            query.section_id, query.index
        ))
    })?;
    Ok(Json(entry))
}

/// GET /api/sessions/:id/view/:section_name
pub async fn get_view_state(
    State(state): State<AppState>,
    Path((id, section_name)): Path<(Uuid, String)>,
) -> ApiResult<Json<SectionViewState>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.view_state().get(&section_name)))
}

/// PUT /api/sessions/:id/view/:section_name
pub async fn put_view_state(
    State(state): State<AppState>,
    Path((id, section_name)): Path<(Uuid, String)>,
    Json(view): Json<SectionViewState>,
) -> ApiResult<Json<SectionViewState>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    session.view_state_mut().set(section_name, view.clone());
    Ok(Json(view))
}
