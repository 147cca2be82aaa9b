//! JSON-file document store and the access-key adapter over it.
//!
//! Each collection is one JSON array file under the panel root. A single
//! document write is atomic (temp file + rename), but there is no
//! transaction across collections: a crash between a key write and the
//! matching audit append leaves the audit trail best-effort. Uniqueness
//! checks are read-then-write under one process-wide flock; a store shared
//! by writers on different hosts would need uniqueness enforced by the
//! store itself.

use crate::constants;
use crate::core::lock::StoreLock;
use crate::core::paths::PanelPaths;
use crate::error::StoreError;
use crate::models::key::AccessKey;
use crate::models::role::Role;
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Generate an opaque document id: random bytes, hex-encoded.
pub fn new_doc_id() -> String {
    let bytes: [u8; constants::DOC_ID_BYTES] = OsRng.gen();
    let mut id = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        id.push_str(&format!("{:02x}", b));
    }
    id
}

/// Parse a JSON document file. Missing or empty files are `None`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace a JSON document file atomically, mode 0600.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(io_err)?;

    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::STORE_FILE_MODE);
        tmp.as_file().set_permissions(perm).map_err(io_err)?;
    }

    tmp.persist(path).map_err(|err| StoreError::Io {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

/// One JSON-array collection on disk.
///
/// `read` and `write` do no locking of their own; callers hold the
/// appropriate [`StoreLock`] around a read-modify-write cycle.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    path: PathBuf,
    _records: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            _records: PhantomData,
        }
    }

    /// Every document in the collection. Never written means empty.
    pub fn read(&self) -> Result<Vec<T>, StoreError> {
        Ok(read_json_file(&self.path)?.unwrap_or_default())
    }

    /// Replace the whole collection.
    pub fn write(&self, records: &[T]) -> Result<(), StoreError> {
        write_json_file(&self.path, &records)
    }
}

/// Typed adapter over the key collection: the only way the rest of the
/// crate touches stored access keys.
#[derive(Debug, Clone)]
pub struct KeyStore {
    coll: Collection<AccessKey>,
    lock: PathBuf,
}

impl KeyStore {
    pub fn open(paths: &PanelPaths) -> Self {
        Self {
            coll: Collection::open(paths.keys_file.clone()),
            lock: paths.store_lock.clone(),
        }
    }

    /// Snapshot of all live keys.
    pub fn list(&self) -> Result<Vec<AccessKey>, StoreError> {
        let _lock = StoreLock::shared(&self.lock)?;
        self.coll.read()
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<AccessKey>, StoreError> {
        Ok(self.list()?.into_iter().find(|k| k.id == id))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<AccessKey>, StoreError> {
        Ok(self.list()?.into_iter().find(|k| k.username == username))
    }

    /// Exact-match lookup on both username and secret, byte for byte.
    pub fn find_login(&self, username: &str, value: &str) -> Result<Option<AccessKey>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|k| k.username == username && k.value == value))
    }

    /// Insert a new key, assigning its id. Returns the stored record.
    pub fn insert(
        &self,
        username: &str,
        value: &str,
        role: Role,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<AccessKey, StoreError> {
        let _lock = StoreLock::exclusive(&self.lock)?;
        let mut keys = self.coll.read()?;
        let key = AccessKey {
            id: new_doc_id(),
            username: username.to_string(),
            value: value.to_string(),
            role,
            expires_at,
        };
        keys.push(key.clone());
        self.coll.write(&keys)?;
        Ok(key)
    }

    /// Replace the stored secret for `id` in place, identity untouched.
    /// Returns false if the id no longer resolves.
    pub fn update_value(&self, id: &str, new_value: &str) -> Result<bool, StoreError> {
        let _lock = StoreLock::exclusive(&self.lock)?;
        let mut keys = self.coll.read()?;
        let Some(key) = keys.iter_mut().find(|k| k.id == id) else {
            return Ok(false);
        };
        key.value = new_value.to_string();
        self.coll.write(&keys)?;
        Ok(true)
    }

    /// Delete by id. Returns false if nothing matched.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _lock = StoreLock::exclusive(&self.lock)?;
        let mut keys = self.coll.read()?;
        let before = keys.len();
        keys.retain(|k| k.id != id);
        if keys.len() == before {
            return Ok(false);
        }
        self.coll.write(&keys)?;
        Ok(true)
    }
}
