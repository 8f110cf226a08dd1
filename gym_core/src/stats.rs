//! Training statistics derived from session history.
//!
//! Every function takes `now` explicitly so results are reproducible.
//! Weeks and days are computed in UTC.

use crate::catalog::ExerciseCatalog;
use crate::{Error, MuscleGroup, Session};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Longest look-back when counting a streak
pub const MAX_STREAK_WEEKS: u32 = 52;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChartRange {
    #[serde(rename = "1W")]
    Week,
    #[default]
    #[serde(rename = "1M")]
    Month,
    #[serde(rename = "6M")]
    HalfYear,
    #[serde(rename = "1Y")]
    Year,
}

impl ChartRange {
    pub const ALL: [ChartRange; 4] = [
        ChartRange::Week,
        ChartRange::Month,
        ChartRange::HalfYear,
        ChartRange::Year,
    ];

    pub fn days(self) -> i64 {
        match self {
            ChartRange::Week => 7,
            ChartRange::Month => 30,
            ChartRange::HalfYear => 180,
            ChartRange::Year => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartRange::Week => "1W",
            ChartRange::Month => "1M",
            ChartRange::HalfYear => "6M",
            ChartRange::Year => "1Y",
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartRange {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        ChartRange::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Validation(format!("Unknown range '{}' (expected 1W, 1M, 6M or 1Y)", s))
            })
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VolumePoint {
    pub date: DateTime<Utc>,
    pub volume: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WeekCount {
    /// ISO week label, e.g. `2024-W07`
    pub week: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MuscleSplit {
    pub muscle: MuscleGroup,
    pub sets: usize,
}

/// Sessions dated within `range` days before `now`
pub fn filter_by_range<'a>(
    sessions: &'a [Session],
    range: ChartRange,
    now: DateTime<Utc>,
) -> Vec<&'a Session> {
    let cutoff = now - Duration::days(range.days());
    sessions.iter().filter(|s| s.date >= cutoff).collect()
}

/// Σ weight × reps per session, skipping cardio and non-numeric sets
pub fn volume_data<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    catalog: &ExerciseCatalog,
) -> Vec<VolumePoint> {
    sessions
        .into_iter()
        .map(|s| {
            let volume = s
                .logs
                .iter()
                .filter(|(id, _)| !catalog.is_cardio(id))
                .flat_map(|(_, sets)| sets)
                .filter_map(|set| Some(set.weight_value()? * set.reps_value()?))
                .sum();
            VolumePoint {
                date: s.date,
                volume,
            }
        })
        .collect()
}

pub fn iso_week_label(date: DateTime<Utc>) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Session count per ISO week, oldest week first
pub fn frequency_data<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Vec<WeekCount> {
    let mut weeks: BTreeMap<String, usize> = BTreeMap::new();
    for session in sessions {
        *weeks.entry(iso_week_label(session.date)).or_default() += 1;
    }
    weeks
        .into_iter()
        .map(|(week, count)| WeekCount { week, count })
        .collect()
}

/// Sets per muscle group. Exercises missing from the catalog are skipped.
pub fn muscle_split_data<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    catalog: &ExerciseCatalog,
) -> Vec<MuscleSplit> {
    let mut counts: HashMap<MuscleGroup, usize> = HashMap::new();
    for session in sessions {
        for (id, sets) in &session.logs {
            if let Some(exercise) = catalog.get(id) {
                *counts.entry(exercise.muscle).or_default() += sets.len();
            }
        }
    }

    MuscleGroup::ALL
        .into_iter()
        .filter_map(|muscle| {
            counts
                .get(&muscle)
                .map(|&sets| MuscleSplit { muscle, sets })
        })
        .collect()
}

/// Sunday starting the week that contains `date`
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Consecutive weeks (Sunday to Saturday) with at least `weekly_goal` distinct
/// training days, counting back from the current week.
///
/// The current week falling short does not end the streak, since it may
/// still be completed.
pub fn compute_streak(sessions: &[Session], weekly_goal: u8, now: DateTime<Utc>) -> u32 {
    let mut days_by_week: HashMap<NaiveDate, HashSet<NaiveDate>> = HashMap::new();
    for session in sessions {
        let day = session.date.date_naive();
        days_by_week.entry(week_start(day)).or_default().insert(day);
    }

    let current = week_start(now.date_naive());
    let mut streak = 0;
    for i in 0..MAX_STREAK_WEEKS {
        let start = current - Duration::weeks(i as i64);
        let days = days_by_week.get(&start).map_or(0, HashSet::len);
        if days >= weekly_goal as usize {
            streak += 1;
        } else if i > 0 {
            break;
        }
    }
    streak
}

/// Exercise with the most logged sets; ties go to the one seen first
pub fn fav_exercise(sessions: &[Session]) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for session in sessions {
        for (id, sets) in &session.logs {
            let count = counts.entry(id.as_str()).or_insert_with(|| {
                order.push(id.as_str());
                0
            });
            *count += sets.len();
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for id in order {
        let count = counts[id];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id.to_string())
}

/// Mean duration in whole minutes, ignoring zero-length sessions
pub fn avg_duration(sessions: &[Session]) -> u32 {
    let durations: Vec<u32> = sessions
        .iter()
        .map(|s| s.duration)
        .filter(|&d| d > 0)
        .collect();
    if durations.is_empty() {
        return 0;
    }
    let total: u64 = durations.iter().map(|&d| d as u64).sum();
    (total as f64 / durations.len() as f64).round() as u32
}
