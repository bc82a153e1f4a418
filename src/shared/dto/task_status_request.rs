use serde::Deserialize;

use crate::world::TaskStatus;

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}
