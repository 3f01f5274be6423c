//! Persisted progress.
//!
//! Only one value survives between sessions: the highest unlocked
//! difficulty. A store that has never been written reads as
//! [`Difficulty::Normal`].

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::Difficulty;

/// Errors that can occur when reading or writing progress.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Stored document is malformed
    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Backing store for the unlocked difficulty.
pub trait ProgressStore: Send {
    /// Highest unlocked difficulty; `Normal` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the stored value cannot be read.
    fn load_max_difficulty(&self) -> Result<Difficulty, PersistenceError>;

    /// Records the highest unlocked difficulty.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the value cannot be written.
    fn save_max_difficulty(&mut self, difficulty: Difficulty) -> Result<(), PersistenceError>;

    /// Forgets everything.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the stored value cannot be removed.
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// In-memory store, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Difficulty>,
}

impl ProgressStore for MemoryStore {
    fn load_max_difficulty(&self) -> Result<Difficulty, PersistenceError> {
        Ok(self.saved.unwrap_or_default())
    }

    fn save_max_difficulty(&mut self, difficulty: Difficulty) -> Result<(), PersistenceError> {
        self.saved = Some(difficulty);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.saved = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProgressDocument {
    max_difficulty: Difficulty,
}

/// Store backed by a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store writing to `path`. Nothing is touched until the first
    /// save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load_max_difficulty(&self) -> Result<Difficulty, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Difficulty::Normal),
            Err(e) => return Err(e.into()),
        };
        let document: ProgressDocument = serde_json::from_str(&content)?;
        Ok(document.max_difficulty)
    }

    fn save_max_difficulty(&mut self, difficulty: Difficulty) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&ProgressDocument {
            max_difficulty: difficulty,
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_path(name: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("mergewar-{name}-{}-{n}.json", std::process::id()))
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load_max_difficulty().unwrap(), Difficulty::Normal);
        store.save_max_difficulty(Difficulty::Hell).unwrap();
        assert_eq!(store.load_max_difficulty().unwrap(), Difficulty::Hell);
        store.clear().unwrap();
        assert_eq!(store.load_max_difficulty().unwrap(), Difficulty::Normal);
    }

    #[test]
    fn missing_file_reads_as_normal() {
        let store = JsonFileStore::new(scratch_path("missing"));
        assert_eq!(store.load_max_difficulty().unwrap(), Difficulty::Normal);
    }

    #[test]
    fn file_store_persists_between_instances() {
        let path = scratch_path("persist");
        let mut store = JsonFileStore::new(&path);
        store.save_max_difficulty(Difficulty::Hard).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_max_difficulty().unwrap(), Difficulty::Hard);

        store.clear().unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_a_serde_error() {
        let path = scratch_path("corrupt");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::new(&path).load_max_difficulty().unwrap_err();
        assert!(matches!(err, PersistenceError::Serde(_)));
        std::fs::remove_file(&path).unwrap();
    }
}
