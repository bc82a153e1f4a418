use serde::Serialize;

use crate::world::{Project, World};

#[derive(Debug, Serialize)]
pub struct ProjectView<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub task_count: usize,
}

impl<'a> ProjectView<'a> {
    pub fn build(world: &'a World, project: &'a Project) -> Self {
        ProjectView {
            project,
            task_count: world.task_count_in(project.id),
        }
    }
}
