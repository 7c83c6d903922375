//! Validation gate and submission of a session's retry tree

use arcon_common::retry::ValidationIssue;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::sessions::session_not_found;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// POST /api/sessions/:id/submit query
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuery {
    pub priority: Option<bool>,
    /// Client indices are already relative to the canonical script
    #[serde(rename = "fromScript")]
    pub from_script: Option<bool>,
}

/// GET /api/sessions/:id/validate
pub async fn validate_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ValidationResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    let issues = session.validate().err().unwrap_or_default();
    Ok(Json(ValidationResponse {
        valid: issues.is_empty(),
        issues,
    }))
}

/// Result of submitting a session's tree
#[derive(Debug, Serialize)]
pub struct SessionSubmitResponse {
    pub task: String,
    pub priority: bool,
    /// Backend response body
    pub upstream: Value,
    /// False when the tree was edited while the request was in flight; the
    /// session stays open with the later edits unsubmitted
    pub session_closed: bool,
}

/// POST /api/sessions/:id/submit?priority=..&fromScript=..
///
/// Validates and normalizes the session's tree, then sends it upstream.
/// Nothing is sent when validation fails. The session is closed once the
/// backend accepts, unless it changed after the snapshot was taken.
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SubmitQuery>,
) -> ApiResult<Json<SessionSubmitResponse>> {
    let priority = query.priority.unwrap_or(state.default_priority);

    let (snapshot, envelope) = {
        let sessions = state.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
        let envelope = session
            .envelope(query.from_script.unwrap_or(false))
            .map_err(|issues| {
                warn!(session_id = %id, issues = issues.len(), "Submission blocked by validation");
                ApiError::Invalid(issues)
            })?;
        (session.retry().clone(), envelope)
    };

    // Lock is released while the backend call is in flight
    let upstream = state.backend.submit(&envelope, priority).await?;

    let session_closed = {
        let mut sessions = state.sessions.write().await;
        let unchanged = sessions.get(&id).map(|session| session.retry() == &snapshot);
        match unchanged {
            Some(true) => {
                sessions.remove(&id);
                true
            }
            Some(false) => {
                warn!(session_id = %id, task = %envelope.task, "Session edited during submission, keeping it open");
                false
            }
            // Discarded while in flight
            None => true,
        }
    };
    info!(session_id = %id, task = %envelope.task, priority, session_closed, "Submitted retry request");

    Ok(Json(SessionSubmitResponse {
        task: envelope.task,
        priority,
        upstream,
        session_closed,
    }))
}
