//! File-backed storage adapter for anonymous, on-device use.
//!
//! Layout inside the data directory:
//!
//! ```text
//! routines.json          seed routines until the first save
//! sessions.jsonl         finished sessions, append-only, oldest first
//! custom_exercises.json
//! preferences.json
//! active_workout.json    present only while a workout is in progress
//! ad_clicks.json         see crate::ad_policy
//! ```

use crate::providers::storage::{upsert_by, ActiveWorkoutUpdate};
use crate::providers::StorageProvider;
use crate::wal::{self, JsonlSink};
use crate::{
    catalog, state, ActiveWorkout, Error, Exercise, PreferencesPatch, Result, Routine, Session,
    UserPreferences,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ROUTINES_FILE: &str = "routines.json";
const SESSIONS_FILE: &str = "sessions.jsonl";
const CUSTOM_EXERCISES_FILE: &str = "custom_exercises.json";
const PREFERENCES_FILE: &str = "preferences.json";
const ACTIVE_WORKOUT_FILE: &str = "active_workout.json";
pub(crate) const AD_CLICKS_FILE: &str = "ad_clicks.json";

/// Every trait method runs its file work on tokio's blocking pool, since
/// taking a write lock can wait on another process.
pub struct LocalStorage {
    files: Files,
    remote: Option<Arc<dyn StorageProvider>>,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            files: Files { dir: dir.into() },
            remote: None,
        }
    }

    /// Target for [`StorageProvider::migrate_to_remote`]
    pub fn with_remote(mut self, remote: Arc<dyn StorageProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.files.dir
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.files.path(SESSIONS_FILE)
    }

    pub fn ad_clicks_path(&self) -> PathBuf {
        self.files.path(AD_CLICKS_FILE)
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Files) -> Result<T> + Send + 'static,
    {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || work(files))
            .await
            .map_err(|e| Error::Other(format!("storage task failed: {}", e)))?
    }
}

/// Synchronous side of [`LocalStorage`]
#[derive(Debug, Clone)]
struct Files {
    dir: PathBuf,
}

impl Files {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn load_routines(&self) -> Result<Vec<Routine>> {
        Ok(state::load_json(&self.path(ROUTINES_FILE))?.unwrap_or_else(catalog::initial_routines))
    }

    fn update_routines<R>(&self, f: impl FnOnce(&mut Vec<Routine>) -> Result<R>) -> Result<R> {
        // Seeds are the starting point until the first write
        state::update_json_or(&self.path(ROUTINES_FILE), catalog::initial_routines, f)
    }

    fn load_custom_exercises(&self) -> Result<Vec<Exercise>> {
        state::load_or_default(&self.path(CUSTOM_EXERCISES_FILE))
    }

    fn update_custom_exercises<R>(
        &self,
        f: impl FnOnce(&mut Vec<Exercise>) -> Result<R>,
    ) -> Result<R> {
        state::update_json(&self.path(CUSTOM_EXERCISES_FILE), f)
    }

    fn load_preferences(&self) -> Result<UserPreferences> {
        state::load_or_default(&self.path(PREFERENCES_FILE))
    }

    /// Newest first
    fn load_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions = wal::read_sessions(&self.path(SESSIONS_FILE))?;
        sessions.reverse();
        Ok(sessions)
    }

    fn all_files(&self) -> [PathBuf; 6] {
        [
            ROUTINES_FILE,
            SESSIONS_FILE,
            CUSTOM_EXERCISES_FILE,
            PREFERENCES_FILE,
            ACTIVE_WORKOUT_FILE,
            AD_CLICKS_FILE,
        ]
        .map(|name| self.path(name))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn get_routines(&self) -> Result<Vec<Routine>> {
        self.blocking(|files| files.load_routines()).await
    }

    async fn save_routine(&self, routine: Routine) -> Result<Routine> {
        self.blocking(move |files| {
            files.update_routines(|routines| {
                upsert_by(routines, routine.clone(), |a, b| a.id == b.id);
                Ok(())
            })?;
            tracing::info!("Saved routine {} ({})", routine.id, routine.name);
            Ok(routine)
        })
        .await
    }

    async fn delete_routine(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |files| {
            files.update_routines(|routines| {
                let before = routines.len();
                routines.retain(|r| r.id != id);
                if routines.len() == before {
                    return Err(Error::NotFound(format!("routine {}", id)));
                }
                Ok(())
            })?;
            tracing::info!("Deleted routine {}", id);
            Ok(())
        })
        .await
    }

    async fn get_sessions(&self) -> Result<Vec<Session>> {
        self.blocking(|files| files.load_sessions()).await
    }

    async fn save_session(&self, session: Session) -> Result<Session> {
        self.blocking(move |files| {
            JsonlSink::new(files.path(SESSIONS_FILE)).append_unique(&session)?;
            tracing::info!(
                "Saved session {} ({}, {} sets)",
                session.id,
                session.routine_name,
                session.set_count()
            );
            Ok(session)
        })
        .await
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |files| {
            let removed = wal::retain_sessions(&files.path(SESSIONS_FILE), |s| s.id != id)?;
            if removed == 0 {
                return Err(Error::NotFound(format!("session {}", id)));
            }
            tracing::info!("Deleted session {}", id);
            Ok(())
        })
        .await
    }

    async fn get_custom_exercises(&self) -> Result<Vec<Exercise>> {
        self.blocking(|files| files.load_custom_exercises()).await
    }

    async fn save_custom_exercise(&self, exercise: Exercise) -> Result<Exercise> {
        self.blocking(move |files| {
            files.update_custom_exercises(|exercises| {
                upsert_by(exercises, exercise.clone(), |a, b| a.id == b.id);
                Ok(())
            })?;
            tracing::info!("Saved custom exercise {}", exercise.id);
            Ok(exercise)
        })
        .await
    }

    async fn delete_custom_exercise(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |files| {
            files.update_custom_exercises(|exercises| {
                let before = exercises.len();
                exercises.retain(|e| e.id != id);
                if exercises.len() == before {
                    return Err(Error::NotFound(format!("custom exercise {}", id)));
                }
                Ok(())
            })
        })
        .await
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        self.blocking(|files| files.load_preferences()).await
    }

    async fn save_preferences(&self, patch: PreferencesPatch) -> Result<()> {
        self.blocking(move |files| {
            state::update_json(&files.path(PREFERENCES_FILE), |prefs: &mut UserPreferences| {
                patch.apply(prefs)
            })
        })
        .await
    }

    async fn get_active_workout(&self) -> Result<Option<ActiveWorkout>> {
        self.blocking(|files| state::load_json(&files.path(ACTIVE_WORKOUT_FILE)))
            .await
    }

    async fn save_active_workout(&self, workout: Option<ActiveWorkout>) -> Result<()> {
        self.blocking(move |files| {
            let path = files.path(ACTIVE_WORKOUT_FILE);
            match workout {
                Some(workout) => state::save_json(&path, &workout),
                None => state::remove(&path).map(|_| ()),
            }
        })
        .await
    }

    async fn update_active_workout(
        &self,
        update: ActiveWorkoutUpdate,
    ) -> Result<Option<ActiveWorkout>> {
        self.blocking(move |files| {
            state::update_optional_json(&files.path(ACTIVE_WORKOUT_FILE), |slot| {
                let previous = slot.clone();
                update(slot)?;
                Ok(previous)
            })
        })
        .await
    }

    /// Push everything to the remote store, then delete the local files.
    ///
    /// Safe to retry after a partial failure: routines, exercises and
    /// preferences are upserts, and sessions the remote already holds are
    /// skipped. Local files are only removed once every record is accepted.
    async fn migrate_to_remote(&self) -> Result<()> {
        let Some(remote) = &self.remote else {
            tracing::info!("No remote storage configured, keeping data local");
            return Ok(());
        };

        let (routines, exercises, sessions, prefs) = self
            .blocking(|files| {
                Ok((
                    files.load_routines()?,
                    files.load_custom_exercises()?,
                    files.load_sessions()?,
                    files.load_preferences()?,
                ))
            })
            .await?;

        for routine in &routines {
            remote.save_routine(routine.clone()).await?;
        }
        for exercise in &exercises {
            remote.save_custom_exercise(exercise.clone()).await?;
        }

        let migrated: HashSet<String> = remote
            .get_sessions()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let mut pushed = 0;
        // Oldest first, so the remote keeps the same order
        for session in sessions.iter().rev() {
            if migrated.contains(&session.id) {
                tracing::debug!("Session {} already on remote, skipping", session.id);
                continue;
            }
            remote.save_session(session.clone()).await?;
            pushed += 1;
        }
        remote
            .save_preferences(PreferencesPatch::from_full(&prefs))
            .await?;

        self.blocking(|files| {
            for path in files.all_files() {
                state::remove(&path)?;
            }
            Ok(())
        })
        .await?;

        tracing::info!(
            "Migrated {} routines, {} sessions ({} new), {} custom exercises to remote storage",
            routines.len(),
            sessions.len(),
            pushed,
            exercises.len()
        );
        Ok(())
    }
}
