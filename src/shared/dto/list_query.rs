use serde::Deserialize;
use uuid::Uuid;

use crate::world::{Priority, TaskFilter, TaskStatus};

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(q: TaskListQuery) -> Self {
        TaskFilter {
            status: q.status,
            priority: q.priority,
            project_id: q.project_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}
