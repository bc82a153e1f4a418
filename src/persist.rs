//! World ↔ redb persistence.
//!
//! redb is a save file: loaded on boot, flushed on every mutation.
//! Never queried at runtime. World is the runtime truth.

use crate::config::Settings;
use crate::world::{Activity, Event, Project, Subtask, Task, TimeEntry, User, World, ACTIVITY_LIMIT};
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
#[cfg(feature = "profile")]
use std::time::Instant;
use uuid::Uuid;

const WORLD_TASKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("world_tasks");
const WORLD_PROJECTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("world_projects");
const WORLD_SUBTASKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("world_subtasks");
const WORLD_TIME_ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("world_time_entries");
const WORLD_USERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("world_users");
const WORLD_ACTIVITY: TableDefinition<u64, &[u8]> = TableDefinition::new("world_activity");
const WORLD_META: TableDefinition<&str, &[u8]> = TableDefinition::new("world_meta");

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct SaveFile {
    db: Arc<Database>,
}

impl SaveFile {
    /// Open (or create) the save file at the given path.
    /// Creates tables if they don't exist.
    pub fn open(path: &str) -> Result<Self, SaveFileError> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(WORLD_TASKS)?;
            let _ = txn.open_table(WORLD_PROJECTS)?;
            let _ = txn.open_table(WORLD_SUBTASKS)?;
            let _ = txn.open_table(WORLD_TIME_ENTRIES)?;
            let _ = txn.open_table(WORLD_USERS)?;
            let _ = txn.open_table(WORLD_ACTIVITY)?;
            let _ = txn.open_table(WORLD_META)?;
        }
        txn.commit()?;

        Ok(SaveFile { db: Arc::new(db) })
    }

    /// Load the entire World from disk. Called once at boot.
    pub fn load_world(&self) -> Result<World, SaveFileError> {
        let mut world = World::new();
        let txn = self.db.begin_read()?;

        for entry in txn.open_table(WORLD_TASKS)?.iter()? {
            let (_, value) = entry?;
            let task: Task = decode(value.value())?;
            world.tasks.insert(task.id, task);
        }

        for entry in txn.open_table(WORLD_PROJECTS)?.iter()? {
            let (_, value) = entry?;
            let project: Project = decode(value.value())?;
            world.projects.insert(project.id, project);
        }

        for entry in txn.open_table(WORLD_SUBTASKS)?.iter()? {
            let (_, value) = entry?;
            let subtask: Subtask = decode(value.value())?;
            world.subtasks.insert(subtask.id, subtask);
        }

        for entry in txn.open_table(WORLD_TIME_ENTRIES)?.iter()? {
            let (_, value) = entry?;
            let time_entry: TimeEntry = decode(value.value())?;
            world.time_entries.insert(time_entry.id, time_entry);
        }

        for entry in txn.open_table(WORLD_USERS)?.iter()? {
            let (_, value) = entry?;
            let user: User = decode(value.value())?;
            world.users.insert(user.id, user);
        }

        // Newest ACTIVITY_LIMIT entries, pushed front so the log stays oldest first.
        for entry in txn.open_table(WORLD_ACTIVITY)?.iter()?.rev().take(ACTIVITY_LIMIT) {
            let (_, value) = entry?;
            let activity: Activity = decode(value.value())?;
            world.log.push_front(activity);
        }

        let meta_table = txn.open_table(WORLD_META)?;
        if let Some(rev_data) = meta_table.get("revision")? {
            let bytes: [u8; 8] = rev_data
                .value()
                .try_into()
                .map_err(|_| SaveFileError::Decode("revision is not 8 bytes".into()))?;
            world.revision = u64::from_le_bytes(bytes);
        }

        Ok(world)
    }

    /// Flush a single event to disk. Called after every World::apply().
    /// Writes the affected entities, the activity row and the revision in
    /// one transaction.
    pub fn flush(&self, world: &World, event: &Event) -> Result<(), SaveFileError> {
        #[cfg(feature = "profile")]
        let total_start = Instant::now();
        let txn = self.db.begin_write()?;
        {
            #[cfg(feature = "profile")]
            let table_start = Instant::now();
            let mut tasks = txn.open_table(WORLD_TASKS)?;
            let mut projects = txn.open_table(WORLD_PROJECTS)?;
            let mut subtasks = txn.open_table(WORLD_SUBTASKS)?;
            let mut time_entries = txn.open_table(WORLD_TIME_ENTRIES)?;
            let mut activity = txn.open_table(WORLD_ACTIVITY)?;
            let mut meta = txn.open_table(WORLD_META)?;
            #[cfg(feature = "profile")]
            tracing::debug!(elapsed_us = table_start.elapsed().as_micros() as u64, "flush opened tables");

            #[cfg(feature = "profile")]
            let write_start = Instant::now();

            // Look up the current state in World and write whole entities.
            let mut put_task = |id: &Uuid| -> Result<(), SaveFileError> {
                match world.tasks.get(id) {
                    Some(task) => {
                        tasks.insert(id.as_bytes().as_slice(), encode(task)?.as_slice())?;
                    }
                    None => {
                        tasks.remove(id.as_bytes().as_slice())?;
                    }
                }
                Ok(())
            };

            match event {
                Event::TaskCreated { task_id, .. }
                | Event::TaskUpdated { task_id, .. }
                | Event::TimerStarted { task_id, .. }
                | Event::DependencyAdded { task_id, .. }
                | Event::DependencyRemoved { task_id, .. } => {
                    put_task(task_id)?;
                }

                Event::TaskDeleted { task_id, subtask_ids, time_entry_ids, unlinked, .. } => {
                    put_task(task_id)?;
                    for id in unlinked {
                        put_task(id)?;
                    }
                    for id in subtask_ids {
                        subtasks.remove(id.as_bytes().as_slice())?;
                    }
                    for id in time_entry_ids {
                        time_entries.remove(id.as_bytes().as_slice())?;
                    }
                }

                Event::ProjectCreated { project_id, .. }
                | Event::ProjectUpdated { project_id, .. } => {
                    if let Some(project) = world.projects.get(project_id) {
                        projects.insert(project_id.as_bytes().as_slice(), encode(project)?.as_slice())?;
                    }
                }

                Event::ProjectDeleted { project_id, detached, .. } => {
                    projects.remove(project_id.as_bytes().as_slice())?;
                    for id in detached {
                        put_task(id)?;
                    }
                }

                Event::SubtaskCreated { task_id, subtask_id, .. }
                | Event::SubtaskToggled { task_id, subtask_id, .. }
                | Event::SubtaskDeleted { task_id, subtask_id, .. } => {
                    match world.subtasks.get(subtask_id) {
                        Some(subtask) => {
                            subtasks.insert(subtask_id.as_bytes().as_slice(), encode(subtask)?.as_slice())?;
                        }
                        None => {
                            subtasks.remove(subtask_id.as_bytes().as_slice())?;
                        }
                    }
                    // Stored progress follows the subtasks.
                    put_task(task_id)?;
                }

                Event::TimeLogged { task_id, entry_id, .. } => {
                    if let Some(time_entry) = world.time_entries.get(entry_id) {
                        time_entries.insert(entry_id.as_bytes().as_slice(), encode(time_entry)?.as_slice())?;
                    }
                    put_task(task_id)?;
                }
            }

            if let Some(entry) = world.activity_at(event.revision()) {
                activity.insert(entry.revision, encode(entry)?.as_slice())?;
            }
            // Only the newest ACTIVITY_LIMIT rows are ever loaded.
            let cutoff = world.revision.saturating_sub(ACTIVITY_LIMIT as u64);
            if cutoff > 0 {
                activity.retain_in(..=cutoff, |_, _| false)?;
            }

            meta.insert("revision", world.revision.to_le_bytes().as_slice())?;
            #[cfg(feature = "profile")]
            tracing::debug!(elapsed_us = write_start.elapsed().as_micros() as u64, "flush wrote rows and revision");
        }
        #[cfg(feature = "profile")]
        let commit_start = Instant::now();
        txn.commit()?;
        #[cfg(feature = "profile")]
        tracing::debug!(elapsed_us = commit_start.elapsed().as_micros() as u64, total_us = total_start.elapsed().as_micros() as u64, "flush committed transaction");
        Ok(())
    }

    /// Write a user to the save file (registration / seeding).
    pub fn save_user(&self, user: &User) -> Result<(), SaveFileError> {
        let txn = self.db.begin_write()?;
        {
            let mut users = txn.open_table(WORLD_USERS)?;
            users.insert(user.id.as_bytes().as_slice(), encode(user)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Seed the configured admin user if no users exist. Returns true if created.
    pub fn ensure_default_user(
        &self,
        world: &mut World,
        settings: &Settings,
    ) -> Result<bool, SaveFileError> {
        if !world.users.is_empty() {
            return Ok(false);
        }

        let password_hash = crate::auth::hash_password(&settings.default_admin_password)
            .map_err(|e| SaveFileError::Encode(e.to_string()))?;

        let user = User {
            id: Uuid::new_v4(),
            username: settings.default_admin_username.clone(),
            email: settings.default_admin_email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        self.save_user(&user)?;
        world.users.insert(user.id, user);
        Ok(true)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SaveFileError> {
    postcard::to_allocvec(value).map_err(|e| SaveFileError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SaveFileError> {
    postcard::from_bytes(bytes).map_err(|e| SaveFileError::Decode(e.to_string()))
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SaveFileError {
    #[error("redb: {0}")]
    Redb(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("encode: {0}")]
    Encode(String),
}

// redb 2.x has many error types. Blanket them all into SaveFileError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for SaveFileError {
            fn from(e: $t) -> Self { SaveFileError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

// ── Tests ──────────────────────────────────────────────────────
