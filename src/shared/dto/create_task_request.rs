use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::world::{NewTask, Priority, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    pub card_color: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub project_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    /// Replay key; the `Idempotency-Key` header is used when absent.
    pub client_token: Option<String>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl CreateTaskRequest {
    pub fn into_parts(self) -> (NewTask, Option<String>) {
        let new = NewTask {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            progress: self.progress,
            card_color: self.card_color,
            due_date: self.due_date,
            estimated_hours: self.estimated_hours,
            project_id: self.project_id,
            parent_task_id: self.parent_task_id,
        };
        (new, self.client_token.filter(|t| !t.trim().is_empty()))
    }
}
