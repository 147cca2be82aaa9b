//! flock(2)-based locking for the document store.
//!
//! Mutations hold an exclusive lock across the whole read-modify-write
//! cycle; readers hold a shared lock so a half-finished replace is never
//! observed. Locks are per lock file, released when the guard drops.

use crate::error::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// A held lock on a store lock file. Released on drop.
pub struct StoreLock {
    _file: File,
}

impl StoreLock {
    /// Acquire an exclusive lock, blocking until available.
    pub fn exclusive(path: &Path) -> Result<Self, StoreError> {
        let file = open_lock_file(path)?;
        file.lock_exclusive().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { _file: file })
    }

    /// Acquire a shared lock for a read, blocking until available.
    pub fn shared(path: &Path) -> Result<Self, StoreError> {
        let file = open_lock_file(path)?;
        file.lock_shared().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { _file: file })
    }
}

fn open_lock_file(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}
