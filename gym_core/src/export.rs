//! CSV export of session history, one row per logged set.

use crate::{Result, Session};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    session_id: &'a str,
    date: String,
    routine_name: &'a str,
    duration_minutes: u32,
    exercise_id: &'a str,
    /// 1-based, chronological within the exercise
    set_index: usize,
    weight: &'a str,
    reps: &'a str,
    is_pr: bool,
}

fn rows(session: &Session) -> impl Iterator<Item = CsvRow<'_>> {
    session.logs.iter().flat_map(move |(exercise_id, sets)| {
        sets.iter().enumerate().map(move |(i, set)| CsvRow {
            session_id: &session.id,
            date: session.date.to_rfc3339(),
            routine_name: &session.routine_name,
            duration_minutes: session.duration,
            exercise_id,
            set_index: i + 1,
            weight: &set.weight,
            reps: &set.reps,
            is_pr: set.is_pr(),
        })
    })
}

/// Write `sessions` to `csv_path` in the given order, replacing any existing file.
///
/// Returns the number of rows written. The file is synced to disk before
/// returning.
pub fn export_sessions(sessions: &[Session], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(csv_path)?;

    let mut writer = csv::Writer::from_writer(file);
    let mut count = 0;
    for session in sessions {
        for row in rows(session) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!(
        "Exported {} sets from {} sessions to {:?}",
        count,
        sessions.len(),
        csv_path
    );
    Ok(count)
}
