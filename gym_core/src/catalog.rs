//! Built-in exercise catalog and seed routines.
//!
//! Exercise IDs are stable: routines and logged sets refer to them, so they
//! must never be renamed.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> =
    Lazy::new(|| ExerciseCatalog::from_exercises(builtin_exercises()));

/// Demo routines shown to a user with no saved routines
pub static INITIAL_ROUTINES: Lazy<Vec<Routine>> = Lazy::new(initial_routines);

/// Owned copy of the seed routines
pub fn initial_routines() -> Vec<Routine> {
    vec![
        Routine::new("r1", "Full Body", ["sen", "bp", "rem", "pmil", "cinta"]),
        Routine::new(
            "r2",
            "Cardio & Abs",
            ["cinta", "eliptica", "crunch", "plank"],
        ),
    ]
}

/// Get a reference to the cached built-in catalog
pub fn get_default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

const BUILTIN: &[(&str, &str, MuscleGroup)] = &[
    // Cardio
    ("cinta", "Treadmill", MuscleGroup::Cardio),
    ("eliptica", "Elliptical", MuscleGroup::Cardio),
    ("bici", "Stationary Bike", MuscleGroup::Cardio),
    ("escaladora", "Stair Climber", MuscleGroup::Cardio),
    // Chest
    ("bp", "Bench Press", MuscleGroup::Chest),
    ("pi", "Incline Press", MuscleGroup::Chest),
    ("press_mancuerna", "Flat Dumbbell Press", MuscleGroup::Chest),
    ("press_mancuerna_incl", "Incline Dumbbell Press", MuscleGroup::Chest),
    ("ap", "Chest Fly", MuscleGroup::Chest),
    ("ap_incl", "Incline Fly", MuscleGroup::Chest),
    ("polea_cruce", "Cable Crossover", MuscleGroup::Chest),
    ("polea_cruce_baja", "Low Cable Crossover", MuscleGroup::Chest),
    ("pullover_m", "Dumbbell Pullover", MuscleGroup::Chest),
    ("pecho_maq", "Chest Press Machine", MuscleGroup::Chest),
    ("pec_deck", "Pec Deck", MuscleGroup::Chest),
    ("fondos_maq", "Machine Dips", MuscleGroup::Chest),
    // Back
    ("dom", "Pull-ups", MuscleGroup::Back),
    ("dom_asist", "Assisted Pull-ups", MuscleGroup::Back),
    ("jal", "Lat Pulldown", MuscleGroup::Back),
    ("polea_recta", "Straight-Arm Pulldown", MuscleGroup::Back),
    ("pull_polea", "Cable Pullover", MuscleGroup::Back),
    ("face_pull", "Face Pull", MuscleGroup::Back),
    ("rem", "Barbell Row", MuscleGroup::Back),
    ("remo_t", "T-Bar Row", MuscleGroup::Back),
    ("remo_m", "Dumbbell Row", MuscleGroup::Back),
    ("remo_maq", "Row Machine", MuscleGroup::Back),
    // Legs
    ("sen", "Squat", MuscleGroup::Legs),
    ("sen_goblet", "Goblet Squat", MuscleGroup::Legs),
    ("hack", "Hack Squat", MuscleGroup::Legs),
    ("pm", "Deadlift", MuscleGroup::Legs),
    ("rdl_m", "Dumbbell RDL", MuscleGroup::Legs),
    ("pren", "Leg Press", MuscleGroup::Legs),
    ("hip", "Hip Thrust", MuscleGroup::Legs),
    ("pull_through", "Cable Pull-Through", MuscleGroup::Legs),
    ("zancada_m", "Dumbbell Lunges", MuscleGroup::Legs),
    ("ext", "Leg Extension", MuscleGroup::Legs),
    ("fem_tumb", "Lying Leg Curl", MuscleGroup::Legs),
    ("patada_polea", "Cable Kickback", MuscleGroup::Legs),
    ("abduct", "Abductor Machine", MuscleGroup::Legs),
    ("adduct", "Adductor Machine", MuscleGroup::Legs),
    ("gem_maq", "Calf Raise Machine", MuscleGroup::Legs),
    ("gem_m", "Dumbbell Calf Raise", MuscleGroup::Legs),
    // Shoulders
    ("pmil", "Overhead Press", MuscleGroup::Shoulders),
    ("pmil_m", "Dumbbell Shoulder Press", MuscleGroup::Shoulders),
    ("arnold", "Arnold Press", MuscleGroup::Shoulders),
    ("elevl", "Lateral Raise", MuscleGroup::Shoulders),
    ("elevl_polea", "Cable Lateral Raise", MuscleGroup::Shoulders),
    ("elevf", "Front Raise", MuscleGroup::Shoulders),
    ("pajaro", "Rear Delt Fly", MuscleGroup::Shoulders),
    ("polea_rear", "Cable Rear Delt", MuscleGroup::Shoulders),
    ("remo_verti", "Upright Row", MuscleGroup::Shoulders),
    // Arms
    ("curlb", "Barbell Curl", MuscleGroup::Arms),
    ("curlm", "Hammer Curl", MuscleGroup::Arms),
    ("curl_incl", "Incline Dumbbell Curl", MuscleGroup::Arms),
    ("curl_polea", "Low Cable Curl", MuscleGroup::Arms),
    ("curl_inv", "Reverse Curl", MuscleGroup::Arms),
    ("pred_maq", "Preacher Curl Machine", MuscleGroup::Arms),
    ("curl_conc", "Concentration Curl", MuscleGroup::Arms),
    ("polea", "Triceps Pushdown", MuscleGroup::Arms),
    ("tri_soga", "Rope Pushdown", MuscleGroup::Arms),
    ("tri_copa", "Overhead Triceps Extension", MuscleGroup::Arms),
    ("tri_m", "Dumbbell Triceps Extension", MuscleGroup::Arms),
    ("tri_polea_alta", "High Cable Triceps", MuscleGroup::Arms),
    // Abs
    ("plank", "Plank (Time)", MuscleGroup::Abs),
    ("crunch", "Crunch", MuscleGroup::Abs),
    ("crunch_polea", "Cable Crunch", MuscleGroup::Abs),
    ("woodchop", "Wood Chop", MuscleGroup::Abs),
    ("twist_ruso", "Russian Twist", MuscleGroup::Abs),
];

fn builtin_exercises() -> Vec<Exercise> {
    BUILTIN
        .iter()
        .map(|(id, name, muscle)| Exercise::new(*id, *name, *muscle))
        .collect()
}

/// Ordered set of exercises with lookup by ID
#[derive(Clone, Debug)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
    index: HashMap<String, usize>,
}

impl ExerciseCatalog {
    /// Build a catalog; a later entry with a repeated ID replaces the earlier one
    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        let mut catalog = Self {
            exercises: Vec::new(),
            index: HashMap::new(),
        };
        for exercise in exercises {
            catalog.insert(exercise);
        }
        catalog
    }

    fn insert(&mut self, exercise: Exercise) {
        match self.index.get(&exercise.id) {
            Some(&pos) => self.exercises[pos] = exercise,
            None => {
                self.index.insert(exercise.id.clone(), self.exercises.len());
                self.exercises.push(exercise);
            }
        }
    }

    /// The built-in catalog extended with user-defined exercises
    pub fn with_custom(custom: &[Exercise]) -> Self {
        let mut catalog = get_default_catalog().clone();
        for exercise in custom {
            catalog.insert(exercise.clone());
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.index.get(id).map(|&pos| &self.exercises[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_cardio(&self, id: &str) -> bool {
        self.get(id)
            .is_some_and(|e| e.muscle == MuscleGroup::Cardio)
    }

    /// Human-readable name, falling back to the raw ID for unknown exercises
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|e| e.name.as_str()).unwrap_or(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn by_muscle(&self, muscle: MuscleGroup) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.muscle == muscle)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for exercise in &self.exercises {
            if exercise.id.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty ID", exercise.name));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
        }

        for routine in INITIAL_ROUTINES.iter() {
            for id in &routine.exercises {
                if !self.contains(id) {
                    errors.push(format!(
                        "Seed routine '{}' references non-existent exercise '{}'",
                        routine.id, id
                    ));
                }
            }
        }

        errors
    }
}
