//! Persistence backends for the state document.
//!
//! A backend is a plain key-value holder for serialized documents. It knows
//! nothing about [`goblin_types::GameState`]; encoding, caching and fallback
//! to defaults live in [`crate::StateStore`].
//!
//! | Backend | Storage | Use |
//! |---------|---------|-----|
//! | [`MemoryBackend`] | Shared in-process map | Tests, ephemeral runs |
//! | [`JsonFileBackend`] | `<dir>/<key>.json` | The native host |

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StoreError;

/// Key-value persistence for whole serialized documents.
///
/// `save` must replace the value under `key` as a single unit: a reader
/// either sees the previous document or the new one, never a mix.
pub trait StateBackend: Send {
    /// Read the document stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage cannot be written.
    fn save(&mut self, key: &str, document: &str) -> Result<(), StoreError>;
}

// =========================================================================
// In-memory backend
// =========================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    documents: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

/// In-process backend whose clones share the same documents.
///
/// Holding a clone lets a test inspect what was persisted, or flip
/// [`set_fail_reads`](Self::set_fail_reads) and
/// [`set_fail_writes`](Self::set_fail_writes) to simulate storage outages.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `load` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::Release);
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::Release);
    }

    /// Raw document currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.documents().get(key).cloned()
    }

    /// Store a raw document under `key`, bypassing failure switches.
    pub fn insert_raw(&self, key: &str, document: &str) {
        self.documents().insert(key.to_owned(), document.to_owned());
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.inner.fail_reads.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable(format!("read of {key} refused")));
        }
        Ok(self.raw(key))
    }

    fn save(&mut self, key: &str, document: &str) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable(format!("write of {key} refused")));
        }
        self.insert_raw(key, document);
        Ok(())
    }
}

// =========================================================================
// JSON file backend
// =========================================================================

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        tracing::debug!(dir = %dir.display(), "Opened JSON file backend");
        Ok(Self { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateBackend for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, document: &str) -> Result<(), StoreError> {
        let target = self.path_for(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));
        let io_err = |source| StoreError::Io {
            key: key.to_owned(),
            source,
        };
        fs::write(&staging, document).map_err(io_err)?;
        fs::rename(&staging, &target).map_err(io_err)?;
        Ok(())
    }
}
