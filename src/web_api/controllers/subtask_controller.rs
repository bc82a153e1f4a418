use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    shared::dto::subtask_request::CreateSubtaskRequest,
    state::SharedState,
    web_api::extract::{ApiJson, ApiPath},
    world::{Command, Event, WorldError},
};

pub struct SubtaskController {}

impl SubtaskController {
    pub async fn list(
        State(state): State<SharedState>,
        ApiPath(task_id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        if !world.tasks.contains_key(&task_id) {
            return Err(WorldError::TaskNotFound.into());
        }
        Ok(Json(json!({ "success": true, "subtasks": world.subtasks_of(task_id) })))
    }

    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(task_id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<CreateSubtaskRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        let event = state.mutate(Command::CreateSubtask { task_id, title: body.title }, user.id)?;
        Ok((StatusCode::CREATED, Json(subtask_body(&state, &event, "Subtask created")?)))
    }

    pub async fn toggle(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let event = state.mutate(Command::ToggleSubtask { subtask_id: id }, user.id)?;
        Ok(Json(subtask_body(&state, &event, "Subtask updated")?))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let event = state.mutate(Command::DeleteSubtask { subtask_id: id }, user.id)?;
        Ok(Json(subtask_body(&state, &event, "Subtask deleted")?))
    }
}

/// The subtask (if it still exists) and the parent task's new stored progress.
fn subtask_body(state: &SharedState, event: &Event, message: &str) -> Result<Value, ApiError> {
    let subtask_id = match event {
        Event::SubtaskCreated { subtask_id, .. }
        | Event::SubtaskToggled { subtask_id, .. }
        | Event::SubtaskDeleted { subtask_id, .. } => *subtask_id,
        _ => return Err(ApiError::Internal(format!("unexpected event {}", event.kind()))),
    };
    let world = state.read()?;
    let task_progress = event
        .task_id()
        .and_then(|id| world.tasks.get(&id))
        .map(|t| t.progress);

    Ok(json!({
        "success": true,
        "message": message,
        "subtask": world.subtasks.get(&subtask_id),
        "task_progress": task_progress,
    }))
}
