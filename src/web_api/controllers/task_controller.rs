use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    shared::dto::{
        create_task_request::CreateTaskRequest, list_query::{LimitQuery, TaskListQuery},
        task_status_request::TaskStatusRequest, task_view::TaskView,
        update_task_request::UpdateTaskRequest,
    },
    state::{AppState, SharedState},
    web_api::extract::{ApiJson, ApiPath, ApiQuery},
    world::{Command, TaskFilter, WorldError},
};

const IDEMPOTENCY_HEADER: &str = "idempotency-key";
const DEFAULT_RECENT_LIMIT: usize = 6;

pub struct TaskController {}

impl TaskController {
    pub async fn list(
        State(state): State<SharedState>,
        ApiQuery(query): ApiQuery<TaskListQuery>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let tasks = world.filter_tasks(&TaskFilter::from(query));
        let views = TaskView::list(&world, tasks, Utc::now());
        Ok(Json(json!({ "success": true, "count": views.len(), "tasks": views })))
    }

    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        headers: HeaderMap,
        ApiJson(body): ApiJson<CreateTaskRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        let (new, token) = body.into_parts();
        let token = token.or_else(|| {
            headers
                .get(IDEMPOTENCY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        });

        let (task_id, created) = state.create_task_once(new, token.as_deref(), user.id)?;
        let (status, message) = if created {
            (StatusCode::CREATED, "Task created successfully")
        } else {
            (StatusCode::OK, "Task already created")
        };
        Ok((status, Json(task_body(&state, task_id, message)?)))
    }

    pub async fn recent(
        State(state): State<SharedState>,
        ApiQuery(query): ApiQuery<LimitQuery>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let tasks = world.recent_tasks(query.limit.unwrap_or(DEFAULT_RECENT_LIMIT));
        let views = TaskView::list(&world, tasks, Utc::now());
        Ok(Json(json!({ "success": true, "tasks": views })))
    }

    pub async fn get(
        State(state): State<SharedState>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let task = world.tasks.get(&id).ok_or(WorldError::TaskNotFound)?;
        Ok(Json(json!({ "success": true, "task": TaskView::build(&world, task, Utc::now()) })))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<UpdateTaskRequest>,
    ) -> Result<Json<Value>, ApiError> {
        state.mutate(Command::UpdateTask { task_id: id, patch: body.into() }, user.id)?;
        Ok(Json(task_body(&state, id, "Task updated successfully")?))
    }

    pub async fn set_status(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<TaskStatusRequest>,
    ) -> Result<Json<Value>, ApiError> {
        state.mutate(Command::SetTaskStatus { task_id: id, status: body.status }, user.id)?;
        Ok(Json(task_body(&state, id, "Task status updated")?))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        state.mutate(Command::DeleteTask { task_id: id }, user.id)?;
        Ok(Json(json!({ "success": true, "message": "Task deleted successfully" })))
    }
}

/// `{"success": true, "message": ..., "task": <read model>}`.
pub fn task_body(state: &AppState, task_id: Uuid, message: &str) -> Result<Value, ApiError> {
    let world = state.read()?;
    let task = world.tasks.get(&task_id).ok_or(WorldError::TaskNotFound)?;
    Ok(json!({
        "success": true,
        "message": message,
        "task": TaskView::build(&world, task, Utc::now()),
    }))
}
