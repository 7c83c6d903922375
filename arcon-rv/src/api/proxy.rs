//! Update proxy for clients that build their own retry block
//!
//! Body: `{"task": .., "retry": {"sections": [..]} | null, "fromScript": bool}`.
//! The retry block is normalized as received; an absent or malformed block
//! is forwarded as `null`. A block that fails validation is refused with 422
//! and nothing is sent upstream.

use arcon_common::retry::{validator, RetryEnvelope};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PriorityQuery {
    pub priority: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub task: String,
    pub priority: bool,
    /// Backend response body
    pub upstream: Value,
}

/// Artifact id as sent by the client, string or number
fn task_id(body: &Value) -> Option<String> {
    match body.get("task")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// POST /api/update?priority=..
pub async fn proxy_update(
    State(state): State<AppState>,
    Query(query): Query<PriorityQuery>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResponse>> {
    let task = task_id(&body)
        .ok_or_else(|| ApiError::BadRequest("task must be a non-empty string or a number".to_string()))?;
    let from_script = body.get("fromScript").and_then(Value::as_bool).unwrap_or(false);
    let priority = query.priority.unwrap_or(state.default_priority);

    let envelope = RetryEnvelope::from_client_json(task, body.get("retry"), from_script);
    if envelope.retry.is_none() {
        info!(task = %envelope.task, "Forwarding update without a retry block");
    }

    validator::validate_wire(envelope.retry.as_ref()).map_err(|issues| {
        warn!(task = %envelope.task, issues = issues.len(), "Update blocked by validation");
        ApiError::Invalid(issues)
    })?;

    let upstream = state.backend.submit(&envelope, priority).await?;

    Ok(Json(UpdateResponse {
        task: envelope.task,
        priority,
        upstream,
    }))
}
