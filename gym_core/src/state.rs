//! JSON state files with file locking.
//!
//! Every single-document record (routines, preferences, the active workout,
//! the ad click counter) is stored through these helpers. Reads take a shared
//! lock on the document itself. Writers take an exclusive lock on a sidecar
//! `<file>.lock`, write a temp file that is fsynced, and rename it over the
//! original. The sidecar never gets replaced, so it is the one lock every
//! process agrees on.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Exclusive hold on the sidecar lock file of a document. Released on drop.
#[derive(Debug)]
pub struct WriteLock {
    file: File,
    path: PathBuf,
}

impl WriteLock {
    /// Block until the lock guarding `target` is ours
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = lock_path(target);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;

        tracing::trace!("Acquired {:?}", path);
        Ok(Self { file, path })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release {:?}: {}", self.path, e);
        }
    }
}

/// `routines.json` → `routines.json.lock`
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".lock");
    target.with_file_name(name)
}

/// Load a JSON document, returning `None` if the file is missing or unreadable.
///
/// A corrupted file is logged and treated as missing so a bad write can never
/// lock the user out of the app.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No state file at {:?}", path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open state file {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock state file {:?}: {}. Ignoring it.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read state file {:?}: {}. Ignoring it.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded state from {:?}", path);
            Ok(Some(value))
        }
        Err(e) => {
            tracing::warn!("Failed to parse state file {:?}: {}. Ignoring it.", path, e);
            Ok(None)
        }
    }
}

/// Load a JSON document or fall back to `T::default()`
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    Ok(load_json(path)?.unwrap_or_default())
}

/// Atomically write a JSON document under its write lock
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let _lock = WriteLock::acquire(path)?;
    write_atomic(path, value)
}

/// Write to a temp file in the same directory, sync it, rename it over `path`.
/// Callers hold the document's `WriteLock`.
fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved state to {:?}", path);
    Ok(())
}

/// Load, modify and save back a document, holding its write lock throughout.
///
/// Nothing is written when `f` fails. Returns whatever `f` returns.
pub fn update_json<T, R, F>(path: &Path, f: F) -> Result<R>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T) -> Result<R>,
{
    update_json_or(path, T::default, f)
}

/// Like [`update_json`], starting from `default()` when the file is missing or corrupt
pub fn update_json_or<T, R, D, F>(path: &Path, default: D, f: F) -> Result<R>
where
    T: Serialize + DeserializeOwned,
    D: FnOnce() -> T,
    F: FnOnce(&mut T) -> Result<R>,
{
    let _lock = WriteLock::acquire(path)?;
    let mut value = load_json(path)?.unwrap_or_else(default);
    let out = f(&mut value)?;
    write_atomic(path, &value)?;
    Ok(out)
}

/// Read-modify-write for a document that may be absent. Leaving `None` in
/// the slot removes the file.
pub fn update_optional_json<T, R, F>(path: &Path, f: F) -> Result<R>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut Option<T>) -> Result<R>,
{
    let _lock = WriteLock::acquire(path)?;
    let mut slot = load_json(path)?;
    let out = f(&mut slot)?;
    match &slot {
        Some(value) => write_atomic(path, value)?,
        None => {
            remove_file(path)?;
        }
    }
    Ok(out)
}

/// Remove a state file; a missing file is not an error. Returns whether a file was removed.
pub fn remove(path: &Path) -> Result<bool> {
    let _lock = WriteLock::acquire(path)?;
    remove_file(path)
}

fn remove_file(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed state file {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PreferencesPatch, Routine, UserPreferences};

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("routines.json");

        let routines = vec![Routine::new("r1", "Legs", ["sen", "pren"])];
        save_json(&path, &routines).unwrap();

        let loaded: Vec<Routine> = load_json(&path).unwrap().unwrap();
        assert_eq!(loaded, routines);
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let loaded: Option<Vec<Routine>> = load_json(&path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupted_file_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("preferences.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let prefs: UserPreferences = load_or_default(&path).unwrap();
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("preferences.json");

        update_json(&path, |prefs: &mut UserPreferences| {
            PreferencesPatch {
                weekly_goal: Some(2),
                ..Default::default()
            }
            .apply(prefs)
        })
        .unwrap();

        let loaded: UserPreferences = load_or_default(&path).unwrap();
        assert_eq!(loaded.weekly_goal, 2);
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("preferences.json");
        save_json(&path, &UserPreferences::default()).unwrap();

        let result = update_json(&path, |_: &mut UserPreferences| {
            Err::<(), _>(Error::Validation("nope".into()))
        });
        assert!(result.is_err());

        let loaded: UserPreferences = load_or_default(&path).unwrap();
        assert_eq!(loaded, UserPreferences::default());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");

        save_json(&path, &UserPreferences::default()).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json" && e.file_name() != "state.json.lock")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json and its lock, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active_workout.json");

        assert!(!remove(&path).unwrap());
        std::fs::write(&path, "{}").unwrap();
        assert!(remove(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_path_sits_next_to_document() {
        assert_eq!(
            lock_path(Path::new("/data/routines.json")),
            PathBuf::from("/data/routines.json.lock")
        );
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("counter.json");

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        update_json(&path, |count: &mut u32| {
                            *count += 1;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let count: u32 = load_or_default(&path).unwrap();
        assert_eq!(count, 200);
    }

    #[test]
    fn test_update_returns_closure_value() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("routines.json");

        let len = update_json_or(
            &path,
            || vec![Routine::new("r1", "Seed", ["sen"])],
            |routines: &mut Vec<Routine>| {
                routines.push(Routine::new("r2", "Arms", ["curlb"]));
                Ok(routines.len())
            },
        )
        .unwrap();
        assert_eq!(len, 2);

        let loaded: Vec<Routine> = load_or_default(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_optional_update_clears_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active_workout.json");

        update_optional_json(&path, |slot: &mut Option<u32>| {
            assert!(slot.is_none());
            *slot = Some(7);
            Ok(())
        })
        .unwrap();
        assert_eq!(load_json::<u32>(&path).unwrap(), Some(7));

        let previous = update_optional_json(&path, |slot: &mut Option<u32>| Ok(slot.take())).unwrap();
        assert_eq!(previous, Some(7));
        assert!(!path.exists());
    }
}
