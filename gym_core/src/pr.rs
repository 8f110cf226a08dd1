//! Personal-record detection.

use crate::types::parse_number;
use crate::Session;
use std::collections::BTreeMap;

/// Heaviest numeric weight logged for `exercise_id` across `history`
pub fn best_weight(exercise_id: &str, history: &[Session]) -> Option<f64> {
    history
        .iter()
        .filter_map(|s| s.logs.get(exercise_id))
        .flatten()
        .filter_map(|set| set.weight_value())
        .fold(None, |best, w| Some(best.map_or(w, |b: f64| b.max(w))))
}

/// Whether `weight` beats every earlier set of `exercise_id` in `history`.
///
/// The workout currently being logged must not be part of `history`.
/// Non-numeric and non-positive weights are never records.
pub fn check_pr(exercise_id: &str, weight: &str, history: &[Session]) -> bool {
    let Some(new_weight) = parse_number(weight) else {
        return false;
    };
    if new_weight <= 0.0 {
        return false;
    }

    new_weight > best_weight(exercise_id, history).unwrap_or(0.0)
}

/// Best weight per exercise over the whole history
pub fn personal_bests(history: &[Session]) -> BTreeMap<String, f64> {
    let mut bests = BTreeMap::new();
    for session in history {
        for (exercise_id, sets) in &session.logs {
            for w in sets.iter().filter_map(|s| s.weight_value()) {
                bests
                    .entry(exercise_id.clone())
                    .and_modify(|b: &mut f64| *b = b.max(w))
                    .or_insert(w);
            }
        }
    }
    bests
}
