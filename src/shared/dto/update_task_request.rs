use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::nullable::nullable;
use crate::world::{Priority, TaskPatch, TaskStatus};

/// Every field optional. Nullable fields can be cleared with `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub progress: Option<u8>,
    pub card_color: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub project_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_task_id: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            progress: req.progress,
            card_color: req.card_color,
            due_date: req.due_date,
            estimated_hours: req.estimated_hours,
            actual_hours: req.actual_hours,
            project_id: req.project_id,
            parent_task_id: req.parent_task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_differ() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{ "due_date": null, "progress": 40 }"#).unwrap();
        assert_eq!(req.due_date, Some(None));
        assert_eq!(req.project_id, None);
        assert_eq!(req.progress, Some(40));
    }

    #[test]
    fn status_uses_snake_case() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{ "status": "in_progress" }"#).unwrap();
        assert_eq!(req.status, Some(TaskStatus::InProgress));
    }
}
