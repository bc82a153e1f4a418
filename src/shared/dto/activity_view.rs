use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::world::{Activity, Event, World};

/// One activity line, flattened for the feed.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub revision: u64,
    pub at: DateTime<Utc>,
    pub actor: Uuid,
    pub actor_name: Option<String>,
    pub kind: &'static str,
    pub task_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
}

impl ActivityView {
    pub fn build(world: &World, activity: &Activity) -> Self {
        let event = &activity.event;
        // Deleted entities keep the name they had when they went.
        let title = match event {
            Event::TaskDeleted { title, .. } => Some(title.clone()),
            Event::ProjectDeleted { name, .. } => Some(name.clone()),
            _ => event
                .task_id()
                .and_then(|id| world.tasks.get(&id))
                .map(|t| t.title.clone())
                .or_else(|| {
                    event
                        .project_id()
                        .and_then(|id| world.projects.get(&id))
                        .map(|p| p.name.clone())
                }),
        };

        ActivityView {
            revision: activity.revision,
            at: activity.at,
            actor: activity.actor,
            actor_name: world.users.get(&activity.actor).map(|u| u.username.clone()),
            kind: event.kind(),
            task_id: event.task_id(),
            project_id: event.project_id(),
            title,
        }
    }
}
