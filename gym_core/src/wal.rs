//! Append-only session log.
//!
//! Finished sessions are appended to a JSONL (JSON Lines) file. Appends and
//! rewrites both hold the log's sidecar [`WriteLock`], so a delete can never
//! drop a session appended while it ran.

use crate::state::WriteLock;
use crate::{Error, Result, Session};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Session sink trait for persisting sessions
pub trait SessionSink {
    fn append(&mut self, session: &Session) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append `session` unless the log already holds its id
    pub fn append_unique(&mut self, session: &Session) -> Result<()> {
        self.ensure_parent_dir()?;
        let _lock = WriteLock::acquire(&self.path)?;
        if read_sessions(&self.path)?.iter().any(|s| s.id == session.id) {
            return Err(Error::Validation(format!(
                "session {} already exists",
                session.id
            )));
        }
        append_line(&self.path, session)
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &Session) -> Result<()> {
        self.ensure_parent_dir()?;
        let _lock = WriteLock::acquire(&self.path)?;
        append_line(&self.path, session)
    }
}


fn append_line(path: &Path, session: &Session) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    // Readers hold a shared lock on the log itself
    file.lock_exclusive()?;

    // A crash mid-append can leave a partial last line; start a fresh one
    let needs_newline = ends_without_newline(&file)?;

    let mut writer = std::io::BufWriter::new(&file);
    if needs_newline {
        writer.write_all(b"\n")?;
    }
    let line = serde_json::to_string(session)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    file.unlock()?;

    tracing::debug!("Appended session {} to log", session.id);
    Ok(())
}

fn ends_without_newline(mut file: &File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read all sessions from a log file, oldest first
///
/// Lines that fail to parse are logged and skipped.
pub fn read_sessions(path: &Path) -> Result<Vec<Session>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Session>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from log", sessions.len());
    Ok(sessions)
}

/// Replace the whole log with `sessions` (oldest first)
pub fn rewrite_sessions(path: &Path, sessions: &[Session]) -> Result<()> {
    let _lock = WriteLock::acquire(path)?;
    write_log(path, sessions)
}

fn write_log(path: &Path, sessions: &[Session]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("session log {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for session in sessions {
            serde_json::to_writer(&mut writer, session)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Rewrote session log with {} sessions", sessions.len());
    Ok(())
}

/// Drop sessions not matching `keep`. Returns how many were removed.
pub fn retain_sessions<F>(path: &Path, mut keep: F) -> Result<usize>
where
    F: FnMut(&Session) -> bool,
{
    let _lock = WriteLock::acquire(path)?;
    let sessions = read_sessions(path)?;
    let before = sessions.len();
    let kept: Vec<Session> = sessions.into_iter().filter(|s| keep(s)).collect();
    let removed = before - kept.len();

    if removed > 0 {
        write_log(path, &kept)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetLog;
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_session(name: &str) -> Session {
        let mut session = Session {
            id: Uuid::new_v4().to_string(),
            date: Utc::now(),
            routine_name: name.into(),
            duration: 45,
            logs: Default::default(),
        };
        session
            .logs
            .insert("bp".into(), vec![SetLog::new("80", "5").marked_pr(true)]);
        session
    }

    #[test]
    fn test_append_and_read_single_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let session = create_test_session("Push");

        let mut sink = JsonlSink::new(&log_path);
        sink.append(&session).unwrap();

        let sessions = read_sessions(&log_path).unwrap();
        assert_eq!(sessions, vec![session]);
    }

    #[test]
    fn test_append_multiple_sessions_keeps_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        for i in 0..5 {
            sink.append(&create_test_session(&format!("day {}", i)))
                .unwrap();
        }

        let sessions = read_sessions(&log_path).unwrap();
        assert_eq!(sessions.len(), 5);
        assert_eq!(sessions[0].routine_name, "day 0");
        assert_eq!(sessions[4].routine_name, "day 4");
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        sink.append(&create_test_session("good")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
            file.write_all(b"{\"id\": \"half a sess\n").unwrap();
        }
        sink.append(&create_test_session("also good")).unwrap();

        let sessions = read_sessions(&log_path).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_append_after_truncated_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        sink.append(&create_test_session("before")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
            file.write_all(b"{\"id\": \"cut off").unwrap();
        }
        sink.append(&create_test_session("after")).unwrap();

        let names: Vec<_> = read_sessions(&log_path)
            .unwrap()
            .into_iter()
            .map(|s| s.routine_name)
            .collect();
        assert_eq!(names, vec!["before", "after"]);
    }

    #[test]
    fn test_retain_sessions_removes_matching() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        let doomed = create_test_session("doomed");
        sink.append(&create_test_session("a")).unwrap();
        sink.append(&doomed).unwrap();
        sink.append(&create_test_session("b")).unwrap();

        let removed = retain_sessions(&log_path, |s| s.id != doomed.id).unwrap();
        assert_eq!(removed, 1);

        let names: Vec<_> = read_sessions(&log_path)
            .unwrap()
            .into_iter()
            .map(|s| s.routine_name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_append_unique_rejects_known_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let session = create_test_session("once");
        let mut sink = JsonlSink::new(&log_path);
        sink.append_unique(&session).unwrap();
        assert!(matches!(
            sink.append_unique(&session),
            Err(Error::Validation(_))
        ));
        assert_eq!(read_sessions(&log_path).unwrap().len(), 1);
    }

    #[test]
    fn test_appends_survive_concurrent_deletes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("sessions.jsonl");

        let old: Vec<Session> = (0..100)
            .map(|i| create_test_session(&format!("old {}", i)))
            .collect();
        let mut sink = JsonlSink::new(&log_path);
        for session in &old {
            sink.append(session).unwrap();
        }

        let appender_path = log_path.clone();
        let appender = std::thread::spawn(move || {
            let mut sink = JsonlSink::new(&appender_path);
            for i in 0..100 {
                sink.append(&create_test_session(&format!("new {}", i)))
                    .unwrap();
            }
        });

        for session in &old {
            retain_sessions(&log_path, |s| s.id != session.id).unwrap();
        }
        appender.join().unwrap();

        let sessions = read_sessions(&log_path).unwrap();
        assert_eq!(sessions.len(), 100);
        assert!(sessions.iter().all(|s| s.routine_name.starts_with("new")));
    }
}
