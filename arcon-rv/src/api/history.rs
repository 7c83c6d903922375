//! Read-only views over the artifact and its correction history

use arcon_common::retry::{CorrectionRecord, FirstAttemptBlock};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::sessions::session_not_found;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Script text behind a global clip number
#[derive(Debug, Serialize)]
pub struct ClipResponse {
    #[serde(rename = "audioN")]
    pub audio_n: i64,
    #[serde(rename = "sectionId")]
    pub section_id: i64,
    #[serde(rename = "localIndex")]
    pub local_index: usize,
    pub text: String,
}

/// Latest attempt per clip, keyed by `audioN`
#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub latest: BTreeMap<i64, CorrectionRecord>,
}

#[derive(Debug, Serialize)]
pub struct FirstAttemptsResponse {
    pub blocks: Vec<FirstAttemptBlock>,
}

/// GET /api/sessions/:id/clips/:audio_n
pub async fn resolve_clip(
    State(state): State<AppState>,
    Path((id, audio_n)): Path<(Uuid, i64)>,
) -> ApiResult<Json<ClipResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    let location = session
        .locate_clip(audio_n)
        .ok_or_else(|| ApiError::NotFound(format!("clip {} is out of range", audio_n)))?;

    Ok(Json(ClipResponse {
        audio_n,
        section_id: location.section_id,
        local_index: location.local_index,
        text: location.text.to_string(),
    }))
}

/// GET /api/sessions/:id/history/latest
pub async fn latest_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LatestResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    let latest = session.latest_corrections().into_iter().collect();
    Ok(Json(LatestResponse { latest }))
}

/// GET /api/sessions/:id/history/first-attempts
pub async fn first_attempt_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FirstAttemptsResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    Ok(Json(FirstAttemptsResponse {
        blocks: session.first_attempts(),
    }))
}
