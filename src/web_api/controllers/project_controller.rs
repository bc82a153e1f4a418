use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    shared::dto::{
        project_request::{CreateProjectRequest, UpdateProjectRequest},
        project_view::ProjectView,
        task_view::TaskView,
    },
    state::SharedState,
    web_api::extract::{ApiJson, ApiPath},
    world::{Command, Event, TaskFilter, WorldError},
};

pub struct ProjectController {}

impl ProjectController {
    pub async fn list(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let projects: Vec<ProjectView> = world
            .projects_by_name()
            .into_iter()
            .map(|p| ProjectView::build(&world, p))
            .collect();
        Ok(Json(json!({ "success": true, "count": projects.len(), "projects": projects })))
    }

    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiJson(body): ApiJson<CreateProjectRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        let event = state.mutate(
            Command::CreateProject { name: body.name, description: body.description, color: body.color },
            user.id,
        )?;
        let project_id = event
            .project_id()
            .ok_or_else(|| ApiError::Internal("project creation produced no project".into()))?;
        Ok((StatusCode::CREATED, Json(project_body(&state, project_id, "Project created successfully")?)))
    }

    /// The project with its tasks.
    pub async fn get(
        State(state): State<SharedState>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        let project = world.projects.get(&id).ok_or(WorldError::ProjectNotFound)?;
        let tasks = world.filter_tasks(&TaskFilter { project_id: Some(id), ..Default::default() });
        Ok(Json(json!({
            "success": true,
            "project": ProjectView::build(&world, project),
            "tasks": TaskView::list(&world, tasks, Utc::now()),
        })))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<UpdateProjectRequest>,
    ) -> Result<Json<Value>, ApiError> {
        state.mutate(Command::UpdateProject { project_id: id, patch: body.into() }, user.id)?;
        Ok(Json(project_body(&state, id, "Project updated successfully")?))
    }

    /// Tasks are kept and lose their project.
    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let event = state.mutate(Command::DeleteProject { project_id: id }, user.id)?;
        let detached = match &event {
            Event::ProjectDeleted { detached, .. } => detached.len(),
            _ => 0,
        };
        Ok(Json(json!({
            "success": true,
            "message": "Project deleted successfully",
            "detached_tasks": detached,
        })))
    }
}

fn project_body(state: &SharedState, project_id: Uuid, message: &str) -> Result<Value, ApiError> {
    let world = state.read()?;
    let project = world.projects.get(&project_id).ok_or(WorldError::ProjectNotFound)?;
    Ok(json!({
        "success": true,
        "message": message,
        "project": ProjectView::build(&world, project),
    }))
}
