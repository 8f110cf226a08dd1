//! In-process storage adapter.
//!
//! Stands in for a remote store (migration target) and backs tests of the
//! shared workout flow.

use crate::providers::storage::upsert_by;
use crate::providers::storage::ActiveWorkoutUpdate;
use crate::providers::StorageProvider;
use crate::{
    catalog, ActiveWorkout, Error, Exercise, PreferencesPatch, Result, Routine, Session,
    UserPreferences,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Default)]
struct Records {
    routines: Vec<Routine>,
    /// Oldest first
    sessions: Vec<Session>,
    custom_exercises: Vec<Exercise>,
    preferences: UserPreferences,
    active_workout: Option<ActiveWorkout>,
}

#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<Records>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with the seed routines
    pub fn seeded() -> Self {
        Self {
            records: Mutex::new(Records {
                routines: catalog::initial_routines(),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn get_routines(&self) -> Result<Vec<Routine>> {
        Ok(self.records.lock().await.routines.clone())
    }

    async fn save_routine(&self, routine: Routine) -> Result<Routine> {
        let mut records = self.records.lock().await;
        upsert_by(&mut records.routines, routine.clone(), |a, b| a.id == b.id);
        Ok(routine)
    }

    async fn delete_routine(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        let before = records.routines.len();
        records.routines.retain(|r| r.id != id);
        if records.routines.len() == before {
            return Err(Error::NotFound(format!("routine {}", id)));
        }
        Ok(())
    }

    async fn get_sessions(&self) -> Result<Vec<Session>> {
        let records = self.records.lock().await;
        Ok(records.sessions.iter().rev().cloned().collect())
    }

    async fn save_session(&self, session: Session) -> Result<Session> {
        let mut records = self.records.lock().await;
        if records.sessions.iter().any(|s| s.id == session.id) {
            return Err(Error::Validation(format!(
                "session {} already exists",
                session.id
            )));
        }
        records.sessions.push(session.clone());
        Ok(session)
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        let before = records.sessions.len();
        records.sessions.retain(|s| s.id != id);
        if records.sessions.len() == before {
            return Err(Error::NotFound(format!("session {}", id)));
        }
        Ok(())
    }

    async fn get_custom_exercises(&self) -> Result<Vec<Exercise>> {
        Ok(self.records.lock().await.custom_exercises.clone())
    }

    async fn save_custom_exercise(&self, exercise: Exercise) -> Result<Exercise> {
        let mut records = self.records.lock().await;
        upsert_by(&mut records.custom_exercises, exercise.clone(), |a, b| {
            a.id == b.id
        });
        Ok(exercise)
    }

    async fn delete_custom_exercise(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        let before = records.custom_exercises.len();
        records.custom_exercises.retain(|e| e.id != id);
        if records.custom_exercises.len() == before {
            return Err(Error::NotFound(format!("custom exercise {}", id)));
        }
        Ok(())
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        Ok(self.records.lock().await.preferences.clone())
    }

    async fn save_preferences(&self, patch: PreferencesPatch) -> Result<()> {
        let mut records = self.records.lock().await;
        patch.apply(&mut records.preferences)
    }

    async fn get_active_workout(&self) -> Result<Option<ActiveWorkout>> {
        Ok(self.records.lock().await.active_workout.clone())
    }

    async fn save_active_workout(&self, workout: Option<ActiveWorkout>) -> Result<()> {
        self.records.lock().await.active_workout = workout;
        Ok(())
    }

    async fn update_active_workout(
        &self,
        update: ActiveWorkoutUpdate,
    ) -> Result<Option<ActiveWorkout>> {
        let mut records = self.records.lock().await;
        let mut next = records.active_workout.clone();
        update(&mut next)?;
        Ok(std::mem::replace(&mut records.active_workout, next))
    }

    async fn migrate_to_remote(&self) -> Result<()> {
        tracing::debug!("In-memory storage has no remote to migrate to");
        Ok(())
    }
}
