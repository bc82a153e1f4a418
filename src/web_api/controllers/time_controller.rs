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
        task_view::{TaskView, TimeEntryView},
        time_entry_request::{LogTimeRequest, StopTimerRequest},
    },
    state::SharedState,
    web_api::extract::{ApiJson, ApiPath},
    world::{Command, Event, WorldError},
};

pub struct TimeController {}

impl TimeController {
    pub async fn list(
        State(state): State<SharedState>,
        ApiPath(task_id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let world = state.read()?;
        if !world.tasks.contains_key(&task_id) {
            return Err(WorldError::TaskNotFound.into());
        }
        let entries: Vec<TimeEntryView> = world
            .time_entries_of(task_id)
            .into_iter()
            .map(TimeEntryView::from)
            .collect();
        let total: f64 = entries.iter().map(|e| e.duration).sum();
        Ok(Json(json!({
            "success": true,
            "time_entries": entries,
            "total_time_spent": total,
        })))
    }

    pub async fn log(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(task_id): ApiPath<Uuid>,
        ApiJson(body): ApiJson<LogTimeRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        let event = state.mutate(
            Command::LogTime {
                task_id,
                start_time: body.start_time,
                end_time: body.end_time,
                description: body.description,
            },
            user.id,
        )?;
        Ok((StatusCode::CREATED, Json(time_body(&state, task_id, &event, "Time logged")?)))
    }

    pub async fn start_timer(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(task_id): ApiPath<Uuid>,
    ) -> Result<Json<Value>, ApiError> {
        let event = state.mutate(Command::StartTimer { task_id }, user.id)?;
        Ok(Json(time_body(&state, task_id, &event, "Timer started")?))
    }

    /// The body is optional; it only carries a description for the entry.
    pub async fn stop_timer(
        State(state): State<SharedState>,
        Extension(user): Extension<CurrentUser>,
        ApiPath(task_id): ApiPath<Uuid>,
        body: Option<ApiJson<StopTimerRequest>>,
    ) -> Result<Json<Value>, ApiError> {
        let description = body.and_then(|ApiJson(b)| b.description);
        let event = state.mutate(Command::StopTimer { task_id, description }, user.id)?;
        Ok(Json(time_body(&state, task_id, &event, "Timer stopped")?))
    }
}

fn time_body(
    state: &SharedState,
    task_id: Uuid,
    event: &Event,
    message: &str,
) -> Result<Value, ApiError> {
    let world = state.read()?;
    let task = world.tasks.get(&task_id).ok_or(WorldError::TaskNotFound)?;
    let time_entry = match event {
        Event::TimeLogged { entry_id, .. } => world.time_entries.get(entry_id).map(TimeEntryView::from),
        _ => None,
    };
    Ok(json!({
        "success": true,
        "message": message,
        "time_entry": time_entry,
        "task": TaskView::build(&world, task, Utc::now()),
    }))
}
