use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use crate::progress;

pub const DEFAULT_CARD_COLOR: &str = "#fecaca";
pub const DEFAULT_PROJECT_COLOR: &str = "#667eea";

/// How many activity entries stay in memory (newest kept).
pub const ACTIVITY_LIMIT: usize = 500;

// ── Entity types ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A unit of work.
///
/// `progress` is the manually settable value; subtask mutations overwrite
/// it with the subtask ratio. `time_spent` is in hours and grows with every
/// recorded time entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub progress: u8,
    pub card_color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub time_spent: f64,
    pub actual_hours: Option<f64>,
    /// First time a timer was started on this task.
    pub start_date: Option<DateTime<Utc>>,
    pub last_tracked: Option<DateTime<Utc>>,
    pub is_tracking: bool,
    pub project_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    /// Tasks this one depends on.
    pub dependencies: Vec<Uuid>,
}

impl Task {
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => self.status != TaskStatus::Completed && due < now,
            None => false,
        }
    }

    fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Completed {
            self.mark_completed(now);
            return;
        }
        if self.status == TaskStatus::Completed {
            self.completed_at = None;
        }
        self.status = status;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub order: u32,
}

/// A finished interval of work. Duration is always derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
}

impl TimeEntry {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn hours(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 3_600_000.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// ── Commands ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub progress: u8,
    pub card_color: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub project_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            progress: 0,
            card_color: None,
            due_date: None,
            estimated_hours: None,
            project_id: None,
            parent_task_id: None,
        }
    }
}

/// Partial task update. Outer `None` = leave alone; `Some(None)` = clear.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub progress: Option<u8>,
    pub card_color: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
    pub project_id: Option<Option<Uuid>>,
    pub parent_task_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
}

/// Something a client wants to happen. Validated and applied by
/// [`World::apply`], which answers with an [`Event`].
#[derive(Debug, Clone)]
pub enum Command {
    CreateTask(NewTask),
    UpdateTask { task_id: Uuid, patch: TaskPatch },
    SetTaskStatus { task_id: Uuid, status: TaskStatus },
    DeleteTask { task_id: Uuid },
    CreateProject { name: String, description: Option<String>, color: Option<String> },
    UpdateProject { project_id: Uuid, patch: ProjectPatch },
    DeleteProject { project_id: Uuid },
    CreateSubtask { task_id: Uuid, title: String },
    ToggleSubtask { subtask_id: Uuid },
    DeleteSubtask { subtask_id: Uuid },
    StartTimer { task_id: Uuid },
    StopTimer { task_id: Uuid, description: Option<String> },
    LogTime {
        task_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        description: Option<String>,
    },
    AddDependency { task_id: Uuid, depends_on: Uuid },
    RemoveDependency { task_id: Uuid, depends_on: Uuid },
}

// ── Events ────────────────────────────────────────────────────

/// What actually happened, stamped with the revision it was applied at.
/// Carries enough ids for the save file to know which rows to rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    TaskCreated { revision: u64, task_id: Uuid },
    TaskUpdated { revision: u64, task_id: Uuid },
    TaskDeleted {
        revision: u64,
        task_id: Uuid,
        title: String,
        subtask_ids: Vec<Uuid>,
        time_entry_ids: Vec<Uuid>,
        /// Other tasks whose dependency list lost this task.
        unlinked: Vec<Uuid>,
    },
    ProjectCreated { revision: u64, project_id: Uuid },
    ProjectUpdated { revision: u64, project_id: Uuid },
    ProjectDeleted {
        revision: u64,
        project_id: Uuid,
        name: String,
        /// Tasks that used to belong to the project.
        detached: Vec<Uuid>,
    },
    SubtaskCreated { revision: u64, task_id: Uuid, subtask_id: Uuid },
    SubtaskToggled { revision: u64, task_id: Uuid, subtask_id: Uuid, completed: bool },
    SubtaskDeleted { revision: u64, task_id: Uuid, subtask_id: Uuid },
    TimerStarted { revision: u64, task_id: Uuid },
    TimeLogged { revision: u64, task_id: Uuid, entry_id: Uuid },
    DependencyAdded { revision: u64, task_id: Uuid, depends_on: Uuid },
    DependencyRemoved { revision: u64, task_id: Uuid, depends_on: Uuid },
}

impl Event {
    pub fn revision(&self) -> u64 {
        match self {
            Event::TaskCreated { revision, .. }
            | Event::TaskUpdated { revision, .. }
            | Event::TaskDeleted { revision, .. }
            | Event::ProjectCreated { revision, .. }
            | Event::ProjectUpdated { revision, .. }
            | Event::ProjectDeleted { revision, .. }
            | Event::SubtaskCreated { revision, .. }
            | Event::SubtaskToggled { revision, .. }
            | Event::SubtaskDeleted { revision, .. }
            | Event::TimerStarted { revision, .. }
            | Event::TimeLogged { revision, .. }
            | Event::DependencyAdded { revision, .. }
            | Event::DependencyRemoved { revision, .. } => *revision,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::TaskCreated { .. } => "task_created",
            Event::TaskUpdated { .. } => "task_updated",
            Event::TaskDeleted { .. } => "task_deleted",
            Event::ProjectCreated { .. } => "project_created",
            Event::ProjectUpdated { .. } => "project_updated",
            Event::ProjectDeleted { .. } => "project_deleted",
            Event::SubtaskCreated { .. } => "subtask_created",
            Event::SubtaskToggled { .. } => "subtask_toggled",
            Event::SubtaskDeleted { .. } => "subtask_deleted",
            Event::TimerStarted { .. } => "timer_started",
            Event::TimeLogged { .. } => "time_logged",
            Event::DependencyAdded { .. } => "dependency_added",
            Event::DependencyRemoved { .. } => "dependency_removed",
        }
    }

    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Event::TaskCreated { task_id, .. }
            | Event::TaskUpdated { task_id, .. }
            | Event::TaskDeleted { task_id, .. }
            | Event::SubtaskCreated { task_id, .. }
            | Event::SubtaskToggled { task_id, .. }
            | Event::SubtaskDeleted { task_id, .. }
            | Event::TimerStarted { task_id, .. }
            | Event::TimeLogged { task_id, .. }
            | Event::DependencyAdded { task_id, .. }
            | Event::DependencyRemoved { task_id, .. } => Some(*task_id),
            Event::ProjectCreated { .. }
            | Event::ProjectUpdated { .. }
            | Event::ProjectDeleted { .. } => None,
        }
    }

    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            Event::ProjectCreated { project_id, .. }
            | Event::ProjectUpdated { project_id, .. }
            | Event::ProjectDeleted { project_id, .. } => Some(*project_id),
            _ => None,
        }
    }
}

/// One line of the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub revision: u64,
    pub at: DateTime<Utc>,
    pub actor: Uuid,
    pub event: Event,
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Subtask not found")]
    SubtaskNotFound,
    #[error("{0}")]
    Validation(String),
    /// The task is not in a state that allows the command.
    #[error("{0}")]
    InvalidTransition(&'static str),
    #[error("Dependency already exists")]
    DuplicateDependency,
    #[error("Dependency not found")]
    DependencyNotFound,
    #[error("Dependency would create a cycle")]
    DependencyCycle,
}

fn invalid(message: impl Into<String>) -> WorldError {
    WorldError::Validation(message.into())
}

// ── Dashboard numbers ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
    pub todo_tasks: usize,
    /// Percentage with one decimal.
    pub completion_rate: f64,
}

/// Query-string filters for the task list.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
}

// ── The World ──────────────────────────────────────────────────

/// The authoritative state. Lives in memory; loaded from the save file on
/// boot (or seeded with samples in dev mode). Every mutation goes through
/// [`World::apply`].
pub struct World {
    pub tasks: HashMap<Uuid, Task>,
    pub projects: HashMap<Uuid, Project>,
    pub subtasks: HashMap<Uuid, Subtask>,
    pub time_entries: HashMap<Uuid, TimeEntry>,
    pub users: HashMap<Uuid, User>,
    pub revision: u64,
    /// Most recent activity, oldest first, capped at [`ACTIVITY_LIMIT`].
    pub log: VecDeque<Activity>,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> Self {
        World {
            tasks: HashMap::new(),
            projects: HashMap::new(),
            subtasks: HashMap::new(),
            time_entries: HashMap::new(),
            users: HashMap::new(),
            revision: 0,
            log: VecDeque::new(),
        }
    }

    pub fn apply(&mut self, cmd: Command, actor: Uuid) -> Result<Event, WorldError> {
        self.apply_at(cmd, actor, Utc::now())
    }

    /// Apply a command as of `now`. This is THE mutation codepath.
    /// A rejected command leaves the world untouched.
    pub fn apply_at(
        &mut self,
        cmd: Command,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, WorldError> {
        let event = match cmd {
            Command::CreateTask(new) => {
                let title = required(&new.title, "Title is required")?;
                check_progress(new.progress)?;
                let card_color = match new.card_color {
                    Some(color) => check_color(color)?,
                    None => DEFAULT_CARD_COLOR.to_string(),
                };
                if let Some(hours) = new.estimated_hours {
                    check_hours(hours, "estimated_hours")?;
                }
                if let Some(project_id) = new.project_id {
                    if !self.projects.contains_key(&project_id) {
                        return Err(WorldError::ProjectNotFound);
                    }
                }
                if let Some(parent) = new.parent_task_id {
                    if !self.tasks.contains_key(&parent) {
                        return Err(WorldError::TaskNotFound);
                    }
                }

                let mut task = Task {
                    id: Uuid::new_v4(),
                    title,
                    description: new.description,
                    status: TaskStatus::Todo,
                    priority: new.priority,
                    progress: new.progress,
                    card_color,
                    due_date: new.due_date,
                    created_at: now,
                    updated_at: now,
                    completed_at: None,
                    estimated_hours: new.estimated_hours,
                    time_spent: 0.0,
                    actual_hours: None,
                    start_date: None,
                    last_tracked: None,
                    is_tracking: false,
                    project_id: new.project_id,
                    parent_task_id: new.parent_task_id,
                    dependencies: Vec::new(),
                };
                task.set_status(new.status, now);

                let task_id = task.id;
                self.tasks.insert(task_id, task);
                Event::TaskCreated { revision: self.next_revision(), task_id }
            }

            Command::UpdateTask { task_id, patch } => {
                self.validate_patch(task_id, &patch)?;
                let task = self.tasks.get_mut(&task_id).ok_or(WorldError::TaskNotFound)?;

                if let Some(title) = patch.title {
                    task.title = title.trim().to_string();
                }
                if let Some(description) = patch.description {
                    task.description = description;
                }
                if let Some(priority) = patch.priority {
                    task.priority = priority;
                }
                if let Some(progress) = patch.progress {
                    task.progress = progress;
                }
                if let Some(color) = patch.card_color {
                    task.card_color = color;
                }
                if let Some(due_date) = patch.due_date {
                    task.due_date = due_date;
                }
                if let Some(hours) = patch.estimated_hours {
                    task.estimated_hours = hours;
                }
                if let Some(hours) = patch.actual_hours {
                    task.actual_hours = hours;
                }
                if let Some(project_id) = patch.project_id {
                    task.project_id = project_id;
                }
                if let Some(parent) = patch.parent_task_id {
                    task.parent_task_id = parent;
                }
                // Status last so completing wins over a progress value in the same patch.
                if let Some(status) = patch.status {
                    task.set_status(status, now);
                }
                if task.status == TaskStatus::Completed {
                    task.progress = 100;
                }
                task.updated_at = now;

                Event::TaskUpdated { revision: self.next_revision(), task_id }
            }

            Command::SetTaskStatus { task_id, status } => {
                let task = self.tasks.get_mut(&task_id).ok_or(WorldError::TaskNotFound)?;
                task.set_status(status, now);
                task.updated_at = now;
                Event::TaskUpdated { revision: self.next_revision(), task_id }
            }

            Command::DeleteTask { task_id } => {
                let task = self.tasks.remove(&task_id).ok_or(WorldError::TaskNotFound)?;

                let subtask_ids: Vec<Uuid> = self
                    .subtasks
                    .values()
                    .filter(|s| s.task_id == task_id)
                    .map(|s| s.id)
                    .collect();
                for id in &subtask_ids {
                    self.subtasks.remove(id);
                }

                let time_entry_ids: Vec<Uuid> = self
                    .time_entries
                    .values()
                    .filter(|e| e.task_id == task_id)
                    .map(|e| e.id)
                    .collect();
                for id in &time_entry_ids {
                    self.time_entries.remove(id);
                }

                let mut unlinked = Vec::new();
                for other in self.tasks.values_mut() {
                    let mut touched = false;
                    if other.dependencies.contains(&task_id) {
                        other.dependencies.retain(|d| *d != task_id);
                        touched = true;
                    }
                    if other.parent_task_id == Some(task_id) {
                        other.parent_task_id = None;
                        touched = true;
                    }
                    if touched {
                        unlinked.push(other.id);
                    }
                }

                Event::TaskDeleted {
                    revision: self.next_revision(),
                    task_id,
                    title: task.title,
                    subtask_ids,
                    time_entry_ids,
                    unlinked,
                }
            }

            Command::CreateProject { name, description, color } => {
                let name = required(&name, "Project name is required")?;
                let color = match color {
                    Some(color) => check_color(color)?,
                    None => DEFAULT_PROJECT_COLOR.to_string(),
                };
                let project = Project {
                    id: Uuid::new_v4(),
                    name,
                    description,
                    color,
                    created_at: now,
                    updated_at: now,
                };
                let project_id = project.id;
                self.projects.insert(project_id, project);
                Event::ProjectCreated { revision: self.next_revision(), project_id }
            }

            Command::UpdateProject { project_id, patch } => {
                let name = patch
                    .name
                    .as_deref()
                    .map(|n| required(n, "Project name is required"))
                    .transpose()?;
                let color = patch.color.map(check_color).transpose()?;
                let project = self
                    .projects
                    .get_mut(&project_id)
                    .ok_or(WorldError::ProjectNotFound)?;

                if let Some(name) = name {
                    project.name = name;
                }
                if let Some(description) = patch.description {
                    project.description = description;
                }
                if let Some(color) = color {
                    project.color = color;
                }
                project.updated_at = now;
                Event::ProjectUpdated { revision: self.next_revision(), project_id }
            }

            Command::DeleteProject { project_id } => {
                let project = self
                    .projects
                    .remove(&project_id)
                    .ok_or(WorldError::ProjectNotFound)?;

                // Tasks survive; they just lose their project.
                let mut detached = Vec::new();
                for task in self.tasks.values_mut() {
                    if task.project_id == Some(project_id) {
                        task.project_id = None;
                        task.updated_at = now;
                        detached.push(task.id);
                    }
                }

                Event::ProjectDeleted {
                    revision: self.next_revision(),
                    project_id,
                    name: project.name,
                    detached,
                }
            }

            Command::CreateSubtask { task_id, title } => {
                let title = required(&title, "Title is required")?;
                if !self.tasks.contains_key(&task_id) {
                    return Err(WorldError::TaskNotFound);
                }
                let order = self.subtasks.values().filter(|s| s.task_id == task_id).count() as u32;
                let subtask = Subtask {
                    id: Uuid::new_v4(),
                    task_id,
                    title,
                    completed: false,
                    created_at: now,
                    completed_at: None,
                    order,
                };
                let subtask_id = subtask.id;
                self.subtasks.insert(subtask_id, subtask);
                self.refresh_subtask_progress(task_id, now);
                Event::SubtaskCreated { revision: self.next_revision(), task_id, subtask_id }
            }

            Command::ToggleSubtask { subtask_id } => {
                let subtask = self
                    .subtasks
                    .get_mut(&subtask_id)
                    .ok_or(WorldError::SubtaskNotFound)?;
                subtask.completed = !subtask.completed;
                subtask.completed_at = subtask.completed.then_some(now);
                let (task_id, completed) = (subtask.task_id, subtask.completed);

                self.refresh_subtask_progress(task_id, now);
                Event::SubtaskToggled {
                    revision: self.next_revision(),
                    task_id,
                    subtask_id,
                    completed,
                }
            }

            Command::DeleteSubtask { subtask_id } => {
                let subtask = self
                    .subtasks
                    .remove(&subtask_id)
                    .ok_or(WorldError::SubtaskNotFound)?;
                self.refresh_subtask_progress(subtask.task_id, now);
                Event::SubtaskDeleted {
                    revision: self.next_revision(),
                    task_id: subtask.task_id,
                    subtask_id,
                }
            }

            Command::StartTimer { task_id } => {
                let task = self.tasks.get_mut(&task_id).ok_or(WorldError::TaskNotFound)?;
                if task.is_tracking {
                    return Err(WorldError::InvalidTransition("Timer is already running"));
                }
                task.is_tracking = true;
                task.last_tracked = Some(now);
                task.start_date.get_or_insert(now);
                task.updated_at = now;
                Event::TimerStarted { revision: self.next_revision(), task_id }
            }

            Command::StopTimer { task_id, description } => {
                let task = self.tasks.get(&task_id).ok_or(WorldError::TaskNotFound)?;
                if !task.is_tracking {
                    return Err(WorldError::InvalidTransition("Timer is not running"));
                }
                let start_time = task.last_tracked.unwrap_or(now).min(now);
                let entry_id = self.record_time(task_id, start_time, now, description, now);
                if let Some(task) = self.tasks.get_mut(&task_id) {
                    task.is_tracking = false;
                }
                Event::TimeLogged { revision: self.next_revision(), task_id, entry_id }
            }

            Command::LogTime { task_id, start_time, end_time, description } => {
                if !self.tasks.contains_key(&task_id) {
                    return Err(WorldError::TaskNotFound);
                }
                if end_time < start_time {
                    return Err(invalid("end_time must not be before start_time"));
                }
                let entry_id = self.record_time(task_id, start_time, end_time, description, now);
                Event::TimeLogged { revision: self.next_revision(), task_id, entry_id }
            }

            Command::AddDependency { task_id, depends_on } => {
                if !self.tasks.contains_key(&depends_on) {
                    return Err(WorldError::TaskNotFound);
                }
                if task_id == depends_on {
                    return Err(invalid("A task cannot depend on itself"));
                }
                let task = self.tasks.get(&task_id).ok_or(WorldError::TaskNotFound)?;
                if task.dependencies.contains(&depends_on) {
                    return Err(WorldError::DuplicateDependency);
                }
                if self.reaches(depends_on, task_id) {
                    return Err(WorldError::DependencyCycle);
                }
                if let Some(task) = self.tasks.get_mut(&task_id) {
                    task.dependencies.push(depends_on);
                    task.updated_at = now;
                }
                Event::DependencyAdded { revision: self.next_revision(), task_id, depends_on }
            }

            Command::RemoveDependency { task_id, depends_on } => {
                let task = self.tasks.get_mut(&task_id).ok_or(WorldError::TaskNotFound)?;
                if !task.dependencies.contains(&depends_on) {
                    return Err(WorldError::DependencyNotFound);
                }
                task.dependencies.retain(|d| *d != depends_on);
                task.updated_at = now;
                Event::DependencyRemoved { revision: self.next_revision(), task_id, depends_on }
            }
        };

        self.log.push_back(Activity {
            revision: event.revision(),
            at: now,
            actor,
            event: event.clone(),
        });
        while self.log.len() > ACTIVITY_LIMIT {
            self.log.pop_front();
        }
        Ok(event)
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn validate_patch(&self, task_id: Uuid, patch: &TaskPatch) -> Result<(), WorldError> {
        if !self.tasks.contains_key(&task_id) {
            return Err(WorldError::TaskNotFound);
        }
        if let Some(title) = &patch.title {
            required(title, "Title is required")?;
        }
        if let Some(progress) = patch.progress {
            check_progress(progress)?;
        }
        if let Some(color) = &patch.card_color {
            check_color(color.clone())?;
        }
        if let Some(Some(hours)) = patch.estimated_hours {
            check_hours(hours, "estimated_hours")?;
        }
        if let Some(Some(hours)) = patch.actual_hours {
            check_hours(hours, "actual_hours")?;
        }
        if let Some(Some(project_id)) = patch.project_id {
            if !self.projects.contains_key(&project_id) {
                return Err(WorldError::ProjectNotFound);
            }
        }
        if let Some(Some(parent)) = patch.parent_task_id {
            if parent == task_id {
                return Err(invalid("A task cannot be its own parent"));
            }
            if !self.tasks.contains_key(&parent) {
                return Err(WorldError::TaskNotFound);
            }
            if self.descends_from(parent, task_id) {
                return Err(invalid("A task cannot be nested under its own subtree"));
            }
        }
        Ok(())
    }

    /// Rewrite the task's stored progress from its subtasks.
    /// Completed tasks keep 100; a task with no subtasks keeps its value.
    fn refresh_subtask_progress(&mut self, task_id: Uuid, now: DateTime<Utc>) {
        let ratio = progress::subtask_progress(self.subtasks.values().filter(|s| s.task_id == task_id));
        if let Some(task) = self.tasks.get_mut(&task_id) {
            if let Some(ratio) = ratio {
                if task.status != TaskStatus::Completed {
                    task.progress = ratio;
                }
            }
            task.updated_at = now;
        }
    }

    fn record_time(
        &mut self,
        task_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Uuid {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            task_id,
            start_time,
            end_time,
            description,
        };
        let (entry_id, hours) = (entry.id, entry.hours());
        self.time_entries.insert(entry_id, entry);

        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.time_spent += hours;
            task.last_tracked = Some(end_time);
            task.updated_at = now;
        }
        entry_id
    }

    /// True if `ancestor` appears on the parent chain starting at `task_id`.
    fn descends_from(&self, task_id: Uuid, ancestor: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(task_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.tasks.get(&id).and_then(|t| t.parent_task_id);
        }
        false
    }

    /// True if `to` is reachable from `from` by following dependency edges.
    fn reaches(&self, from: Uuid, to: Uuid) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(task) = self.tasks.get(&id) {
                stack.extend(task.dependencies.iter().copied());
            }
        }
        false
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn get_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Subtasks of a task in display order.
    pub fn subtasks_of(&self, task_id: Uuid) -> Vec<&Subtask> {
        let mut subtasks: Vec<&Subtask> =
            self.subtasks.values().filter(|s| s.task_id == task_id).collect();
        subtasks.sort_by_key(|s| (s.order, s.created_at));
        subtasks
    }

    /// Time entries of a task, oldest first.
    pub fn time_entries_of(&self, task_id: Uuid) -> Vec<&TimeEntry> {
        let mut entries: Vec<&TimeEntry> =
            self.time_entries.values().filter(|e| e.task_id == task_id).collect();
        entries.sort_by_key(|e| e.start_time);
        entries
    }

    /// Tasks that list `task_id` among their dependencies.
    pub fn dependents_of(&self, task_id: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| t.dependencies.contains(&task_id))
            .map(|t| t.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn task_count_in(&self, project_id: Uuid) -> usize {
        self.tasks.values().filter(|t| t.project_id == Some(project_id)).count()
    }

    /// Filtered task list, newest first.
    pub fn filter_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
            .filter(|t| filter.project_id.map_or(true, |p| t.project_id == Some(p)))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Most recently updated tasks.
    pub fn recent_tasks(&self, limit: usize) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        tasks.truncate(limit);
        tasks
    }

    /// Projects sorted by name.
    pub fn projects_by_name(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        projects
    }

    /// Newest activity first.
    pub fn recent_activity(&self, limit: usize) -> Vec<&Activity> {
        self.log.iter().rev().take(limit).collect()
    }

    pub fn activity_at(&self, revision: u64) -> Option<&Activity> {
        self.log.iter().rev().find(|a| a.revision == revision)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        let total_tasks = self.tasks.len();
        let count = |status: TaskStatus| self.tasks.values().filter(|t| t.status == status).count();
        let completed_tasks = count(TaskStatus::Completed);
        let in_progress_tasks = count(TaskStatus::InProgress);
        let overdue_tasks = self.tasks.values().filter(|t| t.is_overdue(now)).count();
        let completion_rate = if total_tasks > 0 {
            (completed_tasks as f64 / total_tasks as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        DashboardStats {
            total_tasks,
            completed_tasks,
            in_progress_tasks,
            overdue_tasks,
            todo_tasks: total_tasks - completed_tasks - in_progress_tasks,
            completion_rate,
        }
    }

    /// Dev-mode starter content: one project with one task in it.
    pub fn seed_samples(&mut self, actor: Uuid) -> Result<(), WorldError> {
        let event = self.apply(
            Command::CreateProject {
                name: "Sample Project".into(),
                description: Some("Dev project".into()),
                color: None,
            },
            actor,
        )?;
        let mut task = NewTask::titled("Sample Task");
        task.description = Some("This is a sample task to get you started.".into());
        task.project_id = event.project_id();
        self.apply(Command::CreateTask(task), actor)?;
        Ok(())
    }
}

// ── Validation helpers ─────────────────────────────────────────

fn required(value: &str, message: &str) -> Result<String, WorldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(message));
    }
    Ok(trimmed.to_string())
}

fn check_progress(progress: u8) -> Result<(), WorldError> {
    if progress > 100 {
        return Err(invalid("progress must be between 0 and 100"));
    }
    Ok(())
}

fn check_hours(hours: f64, field: &str) -> Result<(), WorldError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(invalid(format!("{field} must be a non-negative number")));
    }
    Ok(())
}

/// `#rrggbb`, case-insensitive.
fn check_color(color: String) -> Result<String, WorldError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(invalid(format!("invalid color '{color}'")));
    }
    Ok(color)
}

// ── Tests ──────────────────────────────────────────────────────
