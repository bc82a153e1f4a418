use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::progress;
use crate::world::{Subtask, Task, TimeEntry, World, DEFAULT_PROJECT_COLOR};

#[derive(Debug, Serialize)]
pub struct TimeEntryView<'a> {
    #[serde(flatten)]
    pub entry: &'a TimeEntry,
    /// Hours.
    pub duration: f64,
}

impl<'a> From<&'a TimeEntry> for TimeEntryView<'a> {
    fn from(entry: &'a TimeEntry) -> Self {
        TimeEntryView {
            entry,
            duration: entry.hours(),
        }
    }
}

/// Task plus everything the board and detail panes show next to it.
#[derive(Debug, Serialize)]
pub struct TaskView<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub project_name: Option<&'a str>,
    pub project_color: &'a str,
    pub subtasks: Vec<&'a Subtask>,
    pub subtask_count: usize,
    pub completed_subtasks: usize,
    pub subtask_progress: u8,
    pub time_entries: Vec<TimeEntryView<'a>>,
    /// Hours across all time entries.
    pub total_time_spent: f64,
    pub dependent_tasks: Vec<Uuid>,
    pub is_overdue: bool,
    pub calculated_progress: u8,
    pub status_progress: u8,
}

impl<'a> TaskView<'a> {
    pub fn build(world: &'a World, task: &'a Task, now: DateTime<Utc>) -> Self {
        let project = task.project_id.and_then(|id| world.projects.get(&id));
        let subtasks = world.subtasks_of(task.id);
        let entries = world.time_entries_of(task.id);

        TaskView {
            task,
            project_name: project.map(|p| p.name.as_str()),
            project_color: project.map_or(DEFAULT_PROJECT_COLOR, |p| p.color.as_str()),
            subtask_count: subtasks.len(),
            completed_subtasks: subtasks.iter().filter(|s| s.completed).count(),
            subtask_progress: progress::subtask_progress(subtasks.iter().copied()).unwrap_or(0),
            total_time_spent: entries.iter().map(|e| e.hours()).sum(),
            dependent_tasks: world.dependents_of(task.id),
            is_overdue: task.is_overdue(now),
            calculated_progress: progress::weighted_progress(
                task,
                subtasks.iter().copied(),
                entries.iter().copied(),
            ),
            status_progress: progress::status_progress(task),
            time_entries: entries.into_iter().map(TimeEntryView::from).collect(),
            subtasks,
        }
    }

    pub fn list(world: &'a World, tasks: Vec<&'a Task>, now: DateTime<Utc>) -> Vec<Self> {
        tasks
            .into_iter()
            .map(|task| TaskView::build(world, task, now))
            .collect()
    }
}
