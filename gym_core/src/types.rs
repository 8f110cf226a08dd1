//! Core domain types for gymlog.
//!
//! This module defines the records shared by every front end:
//! - Routines (ordered exercise templates)
//! - Set logs and the personal-record marker
//! - The in-progress workout and the archived session
//! - Exercises and muscle groups
//!
//! Field names on the wire are camelCase so stored data stays compatible
//! with the web and mobile clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Routine
// ============================================================================

/// A named, ordered template of exercises a workout can be started from.
///
/// `exercises` holds exercise IDs in prescription order. Duplicates are allowed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<String>,
}

impl Routine {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        exercises: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            exercises: exercises.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, exercise_id: &str) -> bool {
        self.exercises.iter().any(|e| e == exercise_id)
    }
}

// ============================================================================
// Set logs
// ============================================================================

/// Personal-record marker.
///
/// Serializes as the literal `true`. There is no "not a PR" value: a set that
/// is not a record simply carries no marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PrMark;

impl Serialize for PrMark {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for PrMark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if bool::deserialize(deserializer)? {
            Ok(PrMark)
        } else {
            Err(serde::de::Error::custom("isPR marker must be `true`"))
        }
    }
}

/// Legacy clients occasionally wrote `"isPR": false`; read that as "no marker".
fn deserialize_pr_mark<'de, D>(deserializer: D) -> std::result::Result<Option<PrMark>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<bool>::deserialize(deserializer)? {
        Some(true) => Some(PrMark),
        _ => None,
    })
}

/// One logged set for an exercise.
///
/// `weight` and `reps` are kept as entered; numeric interpretation happens in
/// [`crate::pr`] and [`crate::stats`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetLog {
    pub weight: String,
    pub reps: String,
    #[serde(
        rename = "isPR",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_pr_mark"
    )]
    pub pr: Option<PrMark>,
}

impl SetLog {
    pub fn new(weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            weight: weight.into(),
            reps: reps.into(),
            pr: None,
        }
    }

    /// Attach the PR marker when `is_pr` holds; otherwise leave it absent.
    pub fn marked_pr(mut self, is_pr: bool) -> Self {
        self.pr = is_pr.then_some(PrMark);
        self
    }

    pub fn is_pr(&self) -> bool {
        self.pr.is_some()
    }

    /// Weight as a number, if it parses as one (e.g. "BW" does not)
    pub fn weight_value(&self) -> Option<f64> {
        parse_number(&self.weight)
    }

    pub fn reps_value(&self) -> Option<f64> {
        parse_number(&self.reps)
    }
}

/// Leading decimal number of a free-form entry: `"100kg"` → 100,
/// `"72.5 lb"` → 72.5, `"BW"` → none. Leading whitespace is skipped.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Exercise ID → sets in the order they were performed
pub type SetLogs = BTreeMap<String, Vec<SetLog>>;

// ============================================================================
// Workouts and sessions
// ============================================================================

/// The in-progress, mutable record of a workout being logged.
///
/// `routine_name` is copied from the routine at start so later renames or
/// deletions of the routine do not rewrite what the user did.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkout {
    pub routine_id: String,
    pub routine_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub logs: SetLogs,
    #[serde(default)]
    pub extra_exercises: Vec<String>,
}

/// The immutable, archived record of a finished workout.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub date: DateTime<Utc>,
    pub routine_name: String,
    /// Minutes
    pub duration: u32,
    #[serde(default)]
    pub logs: SetLogs,
}

impl Session {
    pub fn set_count(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Exercises
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MuscleGroup {
    Cardio,
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Abs,
    Flexibility,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 8] = [
        MuscleGroup::Cardio,
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Legs,
        MuscleGroup::Shoulders,
        MuscleGroup::Arms,
        MuscleGroup::Abs,
        MuscleGroup::Flexibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Cardio => "Cardio",
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Flexibility => "Flexibility",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MuscleGroup {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        MuscleGroup::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::Validation(format!("Unknown muscle group: {}", s)))
    }
}

/// An exercise from the built-in catalog or defined by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle: MuscleGroup,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>, muscle: MuscleGroup) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            muscle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_roundtrip_preserves_order() {
        let routine = Routine::new("r9", "Push", ["bp", "pmil", "bp", "polea"]);
        let json = serde_json::to_string(&routine).unwrap();
        let parsed: Routine = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.exercises, vec!["bp", "pmil", "bp", "polea"]);
        assert_eq!(parsed, routine);
    }

    #[test]
    fn test_reordering_changes_routine() {
        let a = Routine::new("r", "A", ["sen", "bp"]);
        let b = Routine::new("r", "A", ["bp", "sen"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_log_without_marker_omits_field() {
        let set = SetLog::new("100", "5");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"weight":"100","reps":"5"}"#);
        assert!(!set.is_pr());
    }

    #[test]
    fn test_set_log_marker_serializes_as_true() {
        let set = SetLog::new("100", "5").marked_pr(true);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"weight":"100","reps":"5","isPR":true}"#);
    }

    #[test]
    fn test_marked_pr_false_never_writes_false() {
        let set = SetLog::new("100", "5").marked_pr(false);
        let json = serde_json::to_string(&set).unwrap();
        assert!(!json.contains("isPR"));
    }

    #[test]
    fn test_legacy_false_marker_reads_as_absent() {
        let explicit: SetLog =
            serde_json::from_str(r#"{"weight":"60","reps":"8","isPR":false}"#).unwrap();
        let missing: SetLog = serde_json::from_str(r#"{"weight":"60","reps":"8"}"#).unwrap();

        assert_eq!(explicit, missing);
        assert!(!explicit.is_pr());

        // Re-serializing never produces a false state
        let json = serde_json::to_string(&explicit).unwrap();
        assert!(!json.contains("false"));
    }

    #[test]
    fn test_active_workout_camel_case_and_defaults() {
        let json = r#"{
            "routineId": "r1",
            "routineName": "Full Body",
            "startTime": "2024-03-01T10:00:00Z",
            "logs": { "bp": [ { "weight": "80", "reps": "5", "isPR": true } ] }
        }"#;
        let workout: ActiveWorkout = serde_json::from_str(json).unwrap();

        assert_eq!(workout.routine_id, "r1");
        assert!(workout.extra_exercises.is_empty());
        assert!(workout.logs["bp"][0].is_pr());

        let out = serde_json::to_string(&workout).unwrap();
        assert!(out.contains("\"extraExercises\":[]"));
        assert!(out.contains("\"startTime\""));
    }

    #[test]
    fn test_weight_value_parsing() {
        assert_eq!(SetLog::new("72.5", "8").weight_value(), Some(72.5));
        assert_eq!(SetLog::new("BW", "8").weight_value(), None);
        assert_eq!(SetLog::new(" 40 ", "8").weight_value(), Some(40.0));
        assert_eq!(SetLog::new("100kg", "8").weight_value(), Some(100.0));
        assert_eq!(SetLog::new("72.5 kg", "8").weight_value(), Some(72.5));
        assert_eq!(SetLog::new("80 lb", "8").weight_value(), Some(80.0));
        assert_eq!(SetLog::new("12", "8-10").reps_value(), Some(8.0));
    }

    #[test]
    fn test_parse_number_prefix_rules() {
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("-2.5kg"), Some(-2.5));
        assert_eq!(parse_number("1e3 reps"), Some(1000.0));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("3.x"), Some(3.0));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("kg100"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_muscle_group_from_str() {
        assert_eq!("legs".parse::<MuscleGroup>().unwrap(), MuscleGroup::Legs);
        assert_eq!("Cardio".parse::<MuscleGroup>().unwrap(), MuscleGroup::Cardio);
        assert!("Pecho".parse::<MuscleGroup>().is_err());
    }
}
