use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::task_controller::task_body;
use crate::{
    auth::CurrentUser,
    error::ApiError,
    shared::dto::dependency_request::DependencyRequest,
    state::SharedState,
    web_api::extract::{ApiJson, ApiPath},
    world::Command,
};

pub struct DependencyController {}

impl DependencyController {
    pub async fn add(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(task_id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<DependencyRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        state.mutate(Command::AddDependency { task_id, depends_on: body.depends_on }, user.id)?;
        Ok((StatusCode::CREATED, Json(task_body(&state, task_id, "Dependency added")?)))
    }

    pub async fn remove(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath((task_id, depends_on)): ApiPath<(Uuid, Uuid)>,
    ) -> Result<Json<Value>, ApiError> {
        state.mutate(Command::RemoveDependency { task_id, depends_on }, user.id)?;
        Ok(Json(task_body(&state, task_id, "Dependency removed")?))
    }
}
