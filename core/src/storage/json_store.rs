//! JSON-backed record store shared between the merge loop and user actions

use crate::error::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::fs;
use tracing::{debug, warn};

/// A record guarded by a reader-writer lock and saved to disk on demand
///
/// Readers take the read lock for the duration of a closure, so a reader
/// never observes a half-applied update. Mutations only mark the store
/// dirty; [`RecordStore::save`] writes the file.
pub struct RecordStore<T> {
    data: Arc<RwLock<T>>,
    path: Option<PathBuf>,
    dirty: Arc<AtomicBool>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            path: self.path.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    /// A store that is never written to disk
    pub fn in_memory(value: T) -> Self {
        Self {
            data: Arc::new(RwLock::new(value)),
            path: None,
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load from `path`; a missing or unreadable file yields the default value
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let value = match read_record(&path).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("Record file {} does not exist, starting empty", path.display());
                T::default()
            }
            Err(e) => {
                warn!("{}, starting empty", e);
                T::default()
            }
        };

        Self {
            data: Arc::new(RwLock::new(value)),
            path: Some(path),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the record under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Mutate the record under the write lock and mark it dirty
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut guard);
        self.dirty.store(true, Ordering::Release);
        result
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Write the record to disk if it changed since the last save
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            self.dirty.store(false, Ordering::Release);
            return Ok(());
        };

        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let content = match self.read(|value| serde_json::to_string_pretty(value)) {
            Ok(content) => content,
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                return Err(e.into());
            }
        };

        if let Err(e) = write_atomically(path, content).await {
            self.dirty.store(true, Ordering::Release);
            return Err(StorageError::SaveFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into());
        }

        debug!("Saved records to {}", path.display());
        Ok(())
    }
}

/// Parse the record at `path`; `None` when the file does not exist
async fn read_record<T: DeserializeOwned>(
    path: &Path,
) -> std::result::Result<Option<T>, StorageError> {
    let load_failed = |message: String| StorageError::LoadFailed {
        path: path.display().to_string(),
        message,
    };

    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(load_failed(e.to_string())),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| load_failed(e.to_string()))
}

async fn write_atomically(path: &Path, content: String) -> std::io::Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await
}
