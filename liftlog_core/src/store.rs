//! Key-value persistence for logbook collections.
//!
//! Every collection is stored as JSON text under a well-known key. The
//! [`Store`] trait is injected wherever state is read or written so the
//! pipeline never touches ambient storage. [`FileStore`] keeps one file per
//! key with file locking; [`MemoryStore`] backs tests and embedding.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Well-known store keys
pub mod keys {
    pub const EXERCISE_LOGS: &str = "exerciseLogs";
    pub const IMPORTED_EXERCISES: &str = "importedExercises";
    pub const IMPORTED_ROUTINES: &str = "importedRoutines";
    pub const BODY_STATS: &str = "bodyStats";
    pub const CURRENT_USER_ID: &str = "currentUserId";

    /// Per-user weight log key
    pub fn weight_logs(user_id: &str) -> String {
        format!("weightLogs_{}", user_id)
    }

    /// ASCII letters, digits, `_`, `-` and `.`, not starting with a dot
    pub fn is_valid(key: &str) -> bool {
        !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    /// Whether `user_id` can name a weight log key
    pub fn is_valid_user_id(user_id: &str) -> bool {
        !user_id.is_empty() && is_valid(&weight_logs(user_id))
    }
}

/// JSON text storage keyed by name
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Load and decode a value, or its default when the key is absent.
///
/// A value that does not decode is an error; callers must not overwrite it.
pub fn load_json<T>(store: &dyn Store, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key)? {
        None => Ok(T::default()),
        Some(text) if text.trim().is_empty() => Ok(T::default()),
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| Error::State(format!("stored value for {} is corrupt: {}", key, e))),
    }
}

/// Encode and store a value
pub fn save_json<T>(store: &mut dyn Store, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = keys::is_valid(key);
        if !valid {
            return Err(Error::State(format!("invalid store key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read {} from {:?}", key, path);
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(&self.dir)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old value
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed {:?}", path);
        }
        Ok(())
    }
}
