//! Workout flow shared by every front end.
//!
//! `Tracker` owns no state of its own: the active workout lives in storage so
//! it survives restarts and can be picked up by another process.

use crate::catalog::ExerciseCatalog;
use crate::providers::StorageProvider;
use crate::{pr, ActiveWorkout, Error, Result, Routine, Session, SetLog};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct Tracker {
    storage: Arc<dyn StorageProvider>,
}

impl Tracker {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    /// Built-in catalog merged with the user's custom exercises
    pub async fn catalog(&self) -> Result<ExerciseCatalog> {
        let custom = self.storage.get_custom_exercises().await?;
        Ok(ExerciseCatalog::with_custom(&custom))
    }

    pub async fn routine(&self, id: &str) -> Result<Option<Routine>> {
        Ok(self
            .storage
            .get_routines()
            .await?
            .into_iter()
            .find(|r| r.id == id))
    }

    pub async fn active(&self) -> Result<Option<ActiveWorkout>> {
        self.storage.get_active_workout().await
    }

    async fn require_active(&self) -> Result<ActiveWorkout> {
        self.active().await?.ok_or_else(no_workout)
    }

    /// Run `edit` on the stored workout while storage holds its write lock,
    /// then replay it on the returned snapshot to get its result.
    async fn edit_active<R, F>(&self, edit: F) -> Result<R>
    where
        F: Fn(&mut ActiveWorkout) -> Result<R> + Clone + Send + 'static,
    {
        let stored = edit.clone();
        let previous = self
            .storage
            .update_active_workout(Box::new(move |slot: &mut Option<ActiveWorkout>| {
                let workout = slot.as_mut().ok_or_else(no_workout)?;
                stored(workout).map(|_| ())
            }))
            .await?;

        let mut snapshot = previous.ok_or_else(no_workout)?;
        edit(&mut snapshot)
    }

    pub async fn start(&self, routine_id: &str, now: DateTime<Utc>) -> Result<ActiveWorkout> {
        let routine = self
            .routine(routine_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("routine {}", routine_id)))?;

        let workout = ActiveWorkout::start(&routine, now);
        let fresh = workout.clone();
        self.storage
            .update_active_workout(Box::new(move |slot: &mut Option<ActiveWorkout>| {
                if let Some(current) = slot {
                    return Err(Error::State(format!(
                        "a workout of '{}' is already in progress",
                        current.routine_name
                    )));
                }
                *slot = Some(fresh);
                Ok(())
            }))
            .await?;

        tracing::info!("Started workout '{}'", routine.name);
        Ok(workout)
    }

    /// Log a set, marking it as a PR when it beats the stored history.
    ///
    /// Cardio exercises are never marked. Exercises that are neither in the
    /// routine nor added as extras are rejected; add them first.
    pub async fn log_set(&self, exercise_id: &str, weight: &str, reps: &str) -> Result<SetLog> {
        let weight = weight.trim();
        let reps = reps.trim();
        if weight.is_empty() || reps.is_empty() {
            return Err(Error::Validation("weight and reps are required".into()));
        }

        let workout = self.require_active().await?;
        let routine = self.routine(&workout.routine_id).await?;
        if !workout.allows(routine.as_ref(), exercise_id) {
            return Err(not_in_workout(exercise_id));
        }

        let catalog = self.catalog().await?;
        let is_pr = !catalog.is_cardio(exercise_id) && {
            let history = self.storage.get_sessions().await?;
            pr::check_pr(exercise_id, weight, &history)
        };

        let set = SetLog::new(weight, reps).marked_pr(is_pr);
        let exercise = exercise_id.to_string();
        let set = self
            .edit_active(move |workout| {
                let planned = planned_for(routine.as_ref(), workout);
                if !workout.allows(planned, &exercise) {
                    return Err(not_in_workout(&exercise));
                }
                Ok(workout.log_set(&exercise, set.clone()).clone())
            })
            .await?;

        if is_pr {
            tracing::info!("New personal record on {}: {}", exercise_id, weight);
        }
        Ok(set)
    }

    /// Add a catalog exercise to the running workout. Returns false if already listed.
    pub async fn add_exercise(&self, exercise_id: &str) -> Result<bool> {
        let workout = self.require_active().await?;
        if !self.catalog().await?.contains(exercise_id) {
            return Err(Error::NotFound(format!("exercise {}", exercise_id)));
        }

        let routine = self.routine(&workout.routine_id).await?;
        let exercise = exercise_id.to_string();
        self.edit_active(move |workout| {
            let planned = planned_for(routine.as_ref(), workout);
            Ok(workout.add_extra_exercise(planned, &exercise))
        })
        .await
    }

    pub async fn delete_set(&self, exercise_id: &str, index: usize) -> Result<SetLog> {
        let exercise = exercise_id.to_string();
        self.edit_active(move |workout| workout.delete_set(&exercise, index))
            .await
    }

    /// Archive the workout as a session and clear it.
    ///
    /// The workout is taken out of storage first, so two finishing processes
    /// cannot archive it twice. It is put back if the session cannot be saved.
    pub async fn finish(&self, now: DateTime<Utc>) -> Result<Session> {
        let previous = self
            .storage
            .update_active_workout(Box::new(|slot: &mut Option<ActiveWorkout>| {
                slot.take().map(|_| ()).ok_or_else(no_workout)
            }))
            .await?;
        let workout = previous.ok_or_else(no_workout)?;

        let session = workout.clone().finish(Uuid::new_v4().to_string(), now);
        let session = match self.storage.save_session(session).await {
            Ok(session) => session,
            Err(e) => {
                self.restore(workout).await;
                return Err(e);
            }
        };

        tracing::info!(
            "Finished '{}' after {} min with {} sets",
            session.routine_name,
            session.duration,
            session.set_count()
        );
        Ok(session)
    }

    async fn restore(&self, workout: ActiveWorkout) {
        let result = self
            .storage
            .update_active_workout(Box::new(move |slot: &mut Option<ActiveWorkout>| {
                if slot.is_none() {
                    *slot = Some(workout);
                }
                Ok(())
            }))
            .await;
        if let Err(e) = result {
            tracing::error!("Failed to restore the unsaved workout: {}", e);
        }
    }

    /// Discard the running workout. Returns whether there was one.
    pub async fn cancel(&self) -> Result<bool> {
        let previous = self
            .storage
            .update_active_workout(Box::new(|slot: &mut Option<ActiveWorkout>| {
                *slot = None;
                Ok(())
            }))
            .await?;
        if previous.is_some() {
            tracing::info!("Cancelled workout");
        }
        Ok(previous.is_some())
    }
}

fn no_workout() -> Error {
    Error::State("no workout in progress".into())
}

fn not_in_workout(exercise_id: &str) -> Error {
    Error::Validation(format!(
        "{} is not part of this workout; add it first",
        exercise_id
    ))
}

/// `routine` if it is still the one `workout` was started from
fn planned_for<'a>(routine: Option<&'a Routine>, workout: &ActiveWorkout) -> Option<&'a Routine> {
    routine.filter(|r| r.id == workout.routine_id)
}
