//! In-progress workout operations and conversion into an archived session.

use crate::{ActiveWorkout, Error, Result, Routine, Session, SetLog};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

impl ActiveWorkout {
    /// Begin a workout from `routine`, freezing its current name
    pub fn start(routine: &Routine, now: DateTime<Utc>) -> Self {
        Self {
            routine_id: routine.id.clone(),
            routine_name: routine.name.clone(),
            start_time: now,
            logs: Default::default(),
            extra_exercises: Vec::new(),
        }
    }

    /// The routine's plan followed by mid-session additions, each listed once
    /// even when the routine repeats an exercise.
    ///
    /// Pass `None` when the source routine has since been deleted.
    pub fn exercise_order(&self, routine: Option<&Routine>) -> Vec<String> {
        let mut seen = HashSet::new();
        routine
            .map(|r| r.exercises.as_slice())
            .unwrap_or_default()
            .iter()
            .chain(self.extra_exercises.iter())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// [`exercise_order`](Self::exercise_order), then any other exercise
    /// that has sets logged
    pub fn display_order(&self, routine: Option<&Routine>) -> Vec<String> {
        let mut order = self.exercise_order(routine);
        let logged_elsewhere: Vec<String> = self
            .logs
            .keys()
            .filter(|id| !order.contains(id))
            .cloned()
            .collect();
        order.extend(logged_elsewhere);
        order
    }

    /// Whether sets for `exercise_id` belong in this workout
    pub fn allows(&self, routine: Option<&Routine>, exercise_id: &str) -> bool {
        routine.is_some_and(|r| r.contains(exercise_id))
            || self.extra_exercises.iter().any(|e| e == exercise_id)
            || self.logs.contains_key(exercise_id)
    }

    /// Append a set; returns the stored entry
    pub fn log_set(&mut self, exercise_id: &str, set: SetLog) -> &SetLog {
        let sets = self.logs.entry(exercise_id.to_string()).or_default();
        sets.push(set);
        &sets[sets.len() - 1]
    }

    /// Remove the set at `index` (0-based, chronological)
    pub fn delete_set(&mut self, exercise_id: &str, index: usize) -> Result<SetLog> {
        let sets = self
            .logs
            .get_mut(exercise_id)
            .ok_or_else(|| Error::NotFound(format!("no sets logged for {}", exercise_id)))?;
        if index >= sets.len() {
            return Err(Error::NotFound(format!(
                "set {} of {} (only {} logged)",
                index + 1,
                exercise_id,
                sets.len()
            )));
        }
        Ok(sets.remove(index))
    }

    /// Add an exercise outside the routine's plan. Returns false if it is already listed.
    pub fn add_extra_exercise(&mut self, routine: Option<&Routine>, exercise_id: &str) -> bool {
        let planned = routine.is_some_and(|r| r.contains(exercise_id));
        if planned || self.extra_exercises.iter().any(|e| e == exercise_id) {
            return false;
        }
        self.extra_exercises.push(exercise_id.to_string());
        true
    }

    pub fn set_count(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }

    /// Whole minutes elapsed since start, rounded to nearest
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        duration_minutes(self.start_time, now)
    }

    /// Archive the workout.
    ///
    /// Exercises whose sets were all deleted are dropped from the session.
    pub fn finish(self, id: impl Into<String>, now: DateTime<Utc>) -> Session {
        let duration = self.elapsed_minutes(now);
        let mut logs = self.logs;
        logs.retain(|_, sets| !sets.is_empty());

        Session {
            id: id.into(),
            date: now,
            routine_name: self.routine_name,
            duration,
            logs,
        }
    }
}

/// Minutes between `start` and `end`, rounded half up; negative spans count as zero
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    ((millis + 30_000) / 60_000) as u32
}
