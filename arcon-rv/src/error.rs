//! Error types for arcon-rv
//!
//! Every handler error renders as
//! `{"error": {"code": ..., "message": ..., "details": ...}}`.

use arcon_common::retry::{EditRejection, ValidationIssue};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::BackendError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Edit refused by the retry store (422); the session is unchanged
    #[error("Edit rejected: {0}")]
    EditRejected(#[from] EditRejection),

    /// Retry tree failed validation (422); nothing was sent upstream
    #[error("Retry request failed validation ({} issue(s))", .0.len())]
    Invalid(Vec<ValidationIssue>),

    /// Reprocessing backend failure (502)
    #[error("Backend error: {0}")]
    Upstream(#[from] BackendError),

    /// arcon-common error
    #[error("Common error: {0}")]
    Common(#[from] arcon_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_code, details): (StatusCode, &str, Option<Value>) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::EditRejected(ref rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EDIT_REJECTED",
                serde_json::to_value(rejection).ok(),
            ),
            ApiError::Invalid(ref issues) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                serde_json::to_value(issues).ok(),
            ),
            ApiError::Upstream(BackendError::Status { status, ref body }) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                Some(json!({ "status": status, "body": body })),
            ),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", None),
            ApiError::Common(arcon_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", None)
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR", None),
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
