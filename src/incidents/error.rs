use axum::{response::IntoResponse, Json};

use super::types::IncidentStatus;

/// Domain error taxonomy for the incident engine. Domain errors carry the
/// violated rule so callers see which gate or which source state was
/// expected; `Unavailable` is reserved for persistence failures that
/// survived the repository's retry and is never conflated with the rest.
#[derive(Debug, thiserror::Error)]
pub enum IncidentError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid transition: {attempted} is not allowed while incident is {current}")]
    InvalidTransition {
        attempted: String,
        current: IncidentStatus,
    },
    #[error("Gate not met: {0}")]
    GateNotMet(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: expected version {expected}, incident is at version {actual}")]
    Conflict { expected: u64, actual: u64 },
    #[error("Authorization error: {0}")]
    Authorization(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for IncidentError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. } | Self::GateNotMet(_) | Self::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
