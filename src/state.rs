use std::sync::{Arc, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{poisoned, ApiError};
use crate::idempotency::IdempotencyMap;
use crate::notifications::NotificationStore;
use crate::persist::{SaveFile, SaveFileError};
use crate::world::{Command, Event, NewTask, World, WorldError};

pub struct AppState {
    pub world: RwLock<World>,
    /// `None` in dev mode.
    pub save_file: Option<SaveFile>,
    pub settings: Settings,
    pub idempotency: IdempotencyMap,
    pub notifications: NotificationStore,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("save file: {0}")]
    SaveFile(#[from] SaveFileError),
    #[error("seeding samples: {0}")]
    Seed(#[from] WorldError),
}

/// Build the shared state: load the World from the save file, or seed an
/// in-memory one in dev mode.
pub fn boot(settings: Settings) -> Result<SharedState, BootError> {
    let (world, save_file) = if settings.dev_mode {
        let mut world = World::new();
        world.seed_samples(Uuid::nil())?;
        tracing::info!("dev mode: no save file, sample data seeded");
        (world, None)
    } else {
        let save_file = SaveFile::open(&settings.database_path)?;
        let mut world = save_file.load_world()?;
        if save_file.ensure_default_user(&mut world, &settings)? {
            tracing::info!(
                username = %settings.default_admin_username,
                "created default admin user"
            );
        }
        (world, Some(save_file))
    };

    tracing::info!(
        tasks = world.tasks.len(),
        projects = world.projects.len(),
        users = world.users.len(),
        revision = world.revision,
        "world loaded"
    );

    Ok(Arc::new(AppState {
        world: RwLock::new(world),
        save_file,
        settings,
        idempotency: IdempotencyMap::default(),
        notifications: NotificationStore::default(),
    }))
}

impl AppState {
    pub fn read(&self) -> Result<RwLockReadGuard<'_, World>, ApiError> {
        self.world.read().map_err(poisoned)
    }

    /// Apply a command to the World and flush it to the save file, all
    /// under the write lock.
    pub fn mutate(&self, cmd: Command, actor: Uuid) -> Result<Event, ApiError> {
        let mut world = self.world.write().map_err(poisoned)?;
        self.apply_locked(&mut world, cmd, actor)
    }

    /// Create a task unless `token` already produced one that still exists.
    /// Returns the task id and whether it was created by this call.
    pub fn create_task_once(
        &self,
        new: NewTask,
        token: Option<&str>,
        actor: Uuid,
    ) -> Result<(Uuid, bool), ApiError> {
        let mut world = self.world.write().map_err(poisoned)?;
        if let Some(token) = token {
            match self.idempotency.lookup(token) {
                Some(task_id) if world.tasks.contains_key(&task_id) => {
                    tracing::debug!(%task_id, "replayed task creation");
                    return Ok((task_id, false));
                }
                Some(_) => self.idempotency.forget(token),
                None => {}
            }
        }

        let event = self.apply_locked(&mut world, Command::CreateTask(new), actor)?;
        let task_id = event
            .task_id()
            .ok_or_else(|| ApiError::Internal("task creation produced no task".into()))?;
        if let Some(token) = token {
            self.idempotency.record(token, task_id);
        }
        Ok((task_id, true))
    }

    fn apply_locked(&self, world: &mut World, cmd: Command, actor: Uuid) -> Result<Event, ApiError> {
        let event = world.apply(cmd, actor).map_err(|e| {
            tracing::debug!(error = %e, "command rejected");
            e
        })?;

        if let Some(save_file) = &self.save_file {
            // World stays the truth; the row is rewritten on its next change.
            if let Err(e) = save_file.flush(world, &event) {
                tracing::error!(error = %e, revision = event.revision(), "save file flush failed");
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_state() -> SharedState {
        boot(Settings { dev_mode: true, ..Settings::default() }).unwrap()
    }

    #[test]
    fn dev_boot_seeds_samples() {
        let state = dev_state();
        let world = state.read().unwrap();
        assert!(state.save_file.is_none());
        assert_eq!(world.tasks.len(), 1);
        assert_eq!(world.projects.len(), 1);
    }

    #[test]
    fn replayed_token_returns_same_task() {
        let state = dev_state();
        let (first, created) = state
            .create_task_once(NewTask::titled("Once"), Some("tok-1"), Uuid::nil())
            .unwrap();
        assert!(created);

        let (second, created) = state
            .create_task_once(NewTask::titled("Once"), Some("tok-1"), Uuid::nil())
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(state.read().unwrap().tasks.len(), 2);
    }

    #[test]
    fn token_of_deleted_task_is_forgotten() {
        let state = dev_state();
        let (first, _) = state
            .create_task_once(NewTask::titled("Short lived"), Some("tok-2"), Uuid::nil())
            .unwrap();
        state.mutate(Command::DeleteTask { task_id: first }, Uuid::nil()).unwrap();

        let (second, created) = state
            .create_task_once(NewTask::titled("Short lived"), Some("tok-2"), Uuid::nil())
            .unwrap();
        assert!(created);
        assert_ne!(first, second);
    }

    #[test]
    fn database_boot_seeds_admin() {
        let path = format!("/tmp/taskwise_test_boot_{}.redb", std::process::id());
        let _ = std::fs::remove_file(&path);
        let settings = Settings { database_path: path.clone(), ..Settings::default() };

        let state = boot(settings).unwrap();
        let world = state.read().unwrap();
        assert!(state.save_file.is_some());
        assert!(world.get_user_by_username("admin").is_some());
        assert!(world.tasks.is_empty());
        drop(world);
        drop(state);

        let _ = std::fs::remove_file(&path);
    }
}
