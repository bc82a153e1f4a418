use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::world::WorldError;

/// Everything a handler can fail with. Rendered as
/// `{"success": false, "error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::World(e) => match e {
                WorldError::TaskNotFound
                | WorldError::ProjectNotFound
                | WorldError::SubtaskNotFound
                | WorldError::DependencyNotFound => StatusCode::NOT_FOUND,
                WorldError::Validation(_) | WorldError::InvalidTransition(_) => {
                    StatusCode::BAD_REQUEST
                }
                WorldError::DuplicateDependency | WorldError::DependencyCycle => {
                    StatusCode::CONFLICT
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

/// A poisoned World lock: a handler panicked mid-mutation.
pub fn poisoned<T>(_: T) -> ApiError {
    ApiError::Internal("world lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_errors_map_to_statuses() {
        assert_eq!(ApiError::from(WorldError::TaskNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(WorldError::Validation("Title is required".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(WorldError::DependencyCycle).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized("Invalid token").status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn message_passes_through() {
        let err = ApiError::from(WorldError::TaskNotFound);
        assert_eq!(err.to_string(), "Task not found");
    }
}
