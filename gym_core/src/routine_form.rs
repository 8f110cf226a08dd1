//! Create/edit flow for routines.
//!
//! A form is opened in a [`FormMode`]; when no mode is given it opens in
//! [`FormMode::New`]. Edit mode loads an existing routine and keeps its id,
//! and any field left out of the draft keeps its stored value.

use crate::catalog::ExerciseCatalog;
use crate::providers::StorageProvider;
use crate::{Error, Result, Routine};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 255;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    #[default]
    New,
    Edit,
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormMode::New => f.write_str("new"),
            FormMode::Edit => f.write_str("edit"),
        }
    }
}

/// User input for a routine. `None` fields keep the stored value in edit mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutineDraft {
    pub name: Option<String>,
    pub exercises: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct RoutineForm {
    mode: FormMode,
    existing: Option<Routine>,
}

impl RoutineForm {
    /// Open the form. Edit mode requires `routine_id` to name a stored routine.
    pub async fn open(
        storage: &dyn StorageProvider,
        mode: Option<FormMode>,
        routine_id: Option<&str>,
    ) -> Result<Self> {
        let mode = mode.unwrap_or_default();
        let existing = match (mode, routine_id) {
            (FormMode::New, None) => None,
            (FormMode::New, Some(_)) => {
                return Err(Error::Validation(
                    "a routine id can only be given in edit mode".into(),
                ))
            }
            (FormMode::Edit, None) => {
                return Err(Error::Validation("edit mode requires a routine id".into()))
            }
            (FormMode::Edit, Some(id)) => {
                let routine = storage
                    .get_routines()
                    .await?
                    .into_iter()
                    .find(|r| r.id == id)
                    .ok_or_else(|| Error::NotFound(format!("routine {}", id)))?;
                Some(routine)
            }
        };

        tracing::debug!("Opened routine form in {} mode", mode);
        Ok(Self { mode, existing })
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Routine being edited, if any
    pub fn existing(&self) -> Option<&Routine> {
        self.existing.as_ref()
    }

    /// Build the routine the draft describes, without saving it
    pub fn build(&self, draft: RoutineDraft, catalog: &ExerciseCatalog) -> Result<Routine> {
        let (id, name, exercises) = match &self.existing {
            Some(existing) => (
                existing.id.clone(),
                draft.name.unwrap_or_else(|| existing.name.clone()),
                draft.exercises.unwrap_or_else(|| existing.exercises.clone()),
            ),
            None => (
                Uuid::new_v4().to_string(),
                draft.name.unwrap_or_default(),
                draft.exercises.unwrap_or_default(),
            ),
        };

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("routine name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(Error::Validation(format!(
                "routine name is longer than {} characters",
                MAX_NAME_LEN
            )));
        }

        if exercises.is_empty() {
            return Err(Error::Validation("select at least one exercise".into()));
        }
        if let Some(unknown) = exercises.iter().find(|e| !catalog.contains(e)) {
            return Err(Error::NotFound(format!("exercise {}", unknown)));
        }

        Ok(Routine {
            id,
            name,
            exercises,
        })
    }

    /// Validate the draft and save it
    pub async fn submit(
        &self,
        storage: &dyn StorageProvider,
        draft: RoutineDraft,
    ) -> Result<Routine> {
        let custom = storage.get_custom_exercises().await?;
        let routine = self.build(draft, &ExerciseCatalog::with_custom(&custom))?;
        let saved = storage.save_routine(routine).await?;
        tracing::info!("Saved routine '{}' ({})", saved.name, saved.id);
        Ok(saved)
    }
}
