//! Persistence contract for every user-owned record.

use crate::{
    ActiveWorkout, Exercise, PreferencesPatch, Result, Routine, Session, UserPreferences,
};
use async_trait::async_trait;

/// Edit applied by [`StorageProvider::update_active_workout`]. Leaving `None`
/// in the slot clears the workout.
pub type ActiveWorkoutUpdate =
    Box<dyn FnOnce(&mut Option<ActiveWorkout>) -> Result<()> + Send>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageProvider: Send + Sync {
    // Routines
    async fn get_routines(&self) -> Result<Vec<Routine>>;
    /// Insert or replace by `id`
    async fn save_routine(&self, routine: Routine) -> Result<Routine>;
    async fn delete_routine(&self, id: &str) -> Result<()>;

    // Sessions
    /// Newest first
    async fn get_sessions(&self) -> Result<Vec<Session>>;
    async fn save_session(&self, session: Session) -> Result<Session>;
    async fn delete_session(&self, id: &str) -> Result<()>;

    // Custom exercises
    async fn get_custom_exercises(&self) -> Result<Vec<Exercise>>;
    async fn save_custom_exercise(&self, exercise: Exercise) -> Result<Exercise>;
    async fn delete_custom_exercise(&self, id: &str) -> Result<()>;

    // Preferences
    async fn get_preferences(&self) -> Result<UserPreferences>;
    async fn save_preferences(&self, patch: PreferencesPatch) -> Result<()>;

    // Active workout (in progress, survives restarts). `None` clears it.
    async fn get_active_workout(&self) -> Result<Option<ActiveWorkout>>;
    async fn save_active_workout(&self, workout: Option<ActiveWorkout>) -> Result<()>;
    /// Apply `update` with no other writer in between and return the workout
    /// as it was before. Nothing is stored when `update` fails.
    async fn update_active_workout(
        &self,
        update: ActiveWorkoutUpdate,
    ) -> Result<Option<ActiveWorkout>>;

    /// Move anonymous local data to the user's remote store after sign-in
    async fn migrate_to_remote(&self) -> Result<()>;
}

/// Replace the entry with the same id, or append
pub(crate) fn upsert_by<T, F>(items: &mut Vec<T>, item: T, same: F)
where
    F: Fn(&T, &T) -> bool,
{
    match items.iter().position(|existing| same(existing, &item)) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}
