//! Append-only audit trail of privileged key operations.
//!
//! One JSON entry per line. Entries are hash-chained: each carries a
//! SHA-256 over its own canonical JSON plus the hash of the previous
//! entry, so edits to history show up under `history verify`. The trail
//! is best-effort, not a ledger of record: a key write and its audit
//! append are two separate store operations, and a crash between them can
//! leave a key change without its entry.
//!
//! This module is the sole author of entries. Entries are never mutated;
//! they are appended, or wiped in bulk by [`clear`].

use crate::constants;
use crate::core::lock::StoreLock;
use crate::core::paths::PanelPaths;
use crate::core::store;
use crate::error::StoreError;
use crate::models::key::AccessKey;
use crate::models::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Privileged actions that get recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Deleted,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Created => f.write_str("created"),
            AuditAction::Deleted => f.write_str("deleted"),
        }
    }
}

/// One immutable line in the audit log.
///
/// `actor_username`, `target_username`, and `target_role` are snapshots
/// taken when the action happened; reusing a username later does not
/// rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub actor_username: String,
    pub action: AuditAction,
    pub target_username: String,
    pub target_role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_version: Option<u8>,
}

/// Append an entry recording `actor` performing `action` on `target`.
///
/// The id and timestamp are assigned here; callers never supply them.
/// Store failures are propagated, not swallowed.
pub fn append(
    paths: &PanelPaths,
    actor: &AccessKey,
    action: AuditAction,
    target: &AccessKey,
) -> Result<AuditEntry, StoreError> {
    let _lock = StoreLock::exclusive(&paths.audit_lock)?;
    let prev_hash = last_entry_hash(paths)?;

    let mut entry = AuditEntry {
        id: store::new_doc_id(),
        timestamp: Utc::now(),
        actor_username: actor.username.clone(),
        action,
        target_username: target.username.clone(),
        target_role: target.role,
        prev_hash,
        entry_hash: None,
        hash_version: Some(1),
    };
    entry.entry_hash = Some(compute_entry_hash(&entry, &paths.audit_log)?);

    let line = serde_json::to_string(&entry).map_err(|source| StoreError::Corrupt {
        path: paths.audit_log.clone(),
        source,
    })?;
    append_line(paths, &line)?;
    Ok(entry)
}

/// All entries, most recent first. The returned vector is a snapshot; a
/// missing or empty log is an empty, non-error result.
pub fn list(paths: &PanelPaths) -> Result<Vec<AuditEntry>, StoreError> {
    let _lock = StoreLock::shared(&paths.audit_lock)?;
    let mut entries = read_entries(paths)?;
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(entries)
}

/// Wipe the trail unconditionally.
///
/// The developer-only restriction belongs to the lifecycle layer, not
/// here. This is mechanism, not authorization.
pub fn clear(paths: &PanelPaths) -> Result<(), StoreError> {
    let _lock = StoreLock::exclusive(&paths.audit_lock)?;
    if paths.audit_log.exists() {
        fs::remove_file(&paths.audit_log).map_err(|source| StoreError::Io {
            path: paths.audit_log.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Verify the integrity of the audit chain. Returns (total, errors).
pub fn verify_chain(paths: &PanelPaths) -> Result<(usize, Vec<String>), StoreError> {
    let _lock = StoreLock::shared(&paths.audit_lock)?;
    let entries = read_entries(paths)?;
    let mut errors = Vec::new();
    let mut prev_entry_hash: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && entry.prev_hash != prev_entry_hash {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                i + 1,
                prev_entry_hash,
                entry.prev_hash
            ));
        }

        match &entry.entry_hash {
            Some(stored) => match compute_entry_hash(entry, &paths.audit_log) {
                Ok(computed) if &computed == stored => {}
                Ok(_) => errors.push(format!("entry {}: entry_hash mismatch (tampered?)", i + 1)),
                Err(e) => errors.push(format!("entry {}: cannot compute hash: {}", i + 1, e)),
            },
            None => errors.push(format!("entry {}: missing entry_hash", i + 1)),
        }

        prev_entry_hash = entry.entry_hash.clone();
    }

    Ok((entries.len(), errors))
}

/// Canonical hash of an entry: SHA-256 of its JSON with `entry_hash`
/// removed and object keys sorted.
fn compute_entry_hash(entry: &AuditEntry, log_path: &std::path::Path) -> Result<String, StoreError> {
    let mut value = serde_json::to_value(entry).map_err(|source| StoreError::Corrupt {
        path: log_path.to_path_buf(),
        source,
    })?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("entry_hash");
    }
    let canonical = canonicalize_value(&value);
    let canonical_str =
        serde_json::to_string(&canonical).map_err(|source| StoreError::Corrupt {
            path: log_path.to_path_buf(),
            source,
        })?;
    let hash = Sha256::digest(canonical_str.as_bytes());
    Ok(format!("{:064x}", hash))
}

/// Canonicalize JSON by recursively sorting object keys, so the hash does
/// not depend on serializer field order.
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_value(&map[k]));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

fn append_line(paths: &PanelPaths, line: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: paths.audit_log.clone(),
        source,
    };

    if let Some(parent) = paths.audit_log.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.audit_log)
        .map_err(io_err)?;
    writeln!(file, "{}", line).map_err(io_err)?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::AUDIT_LOG_MODE);
        fs::set_permissions(&paths.audit_log, perm).map_err(io_err)?;
    }

    Ok(())
}

/// Entries in file (append) order. Malformed lines are skipped with a
/// stderr warning; `verify_chain` is where tampering becomes an error.
fn read_entries(paths: &PanelPaths) -> Result<Vec<AuditEntry>, StoreError> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }
    let io_err = |source| StoreError::Io {
        path: paths.audit_log.clone(),
        source,
    };

    let file = fs::File::open(&paths.audit_log).map_err(io_err)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in reader.lines() {
        let line = line.map_err(io_err)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        eprintln!("warning: {} malformed audit entries skipped", malformed);
    }

    Ok(entries)
}

fn last_entry_hash(paths: &PanelPaths) -> Result<Option<String>, StoreError> {
    Ok(read_entries(paths)?
        .into_iter()
        .last()
        .and_then(|e| e.entry_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, PanelPaths) {
        let dir = TempDir::new().unwrap();
        let paths = PanelPaths::from_root(dir.path().to_path_buf());
        (dir, paths)
    }

    fn key(username: &str, value: &str, role: Role) -> AccessKey {
        AccessKey {
            id: format!("id-{}", username),
            username: username.to_string(),
            value: value.to_string(),
            role,
            expires_at: None,
        }
    }

    #[test]
    fn test_append_snapshots_actor_and_target() {
        let (_dir, paths) = test_paths();
        let actor = key("root", "rootkey", Role::Developer);
        let target = key("alice", "a1", Role::User);

        let entry = append(&paths, &actor, AuditAction::Created, &target).unwrap();
        assert_eq!(entry.actor_username, "root");
        assert_eq!(entry.target_username, "alice");
        assert_eq!(entry.target_role, Role::User);
        assert!(entry.entry_hash.is_some());
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let (_dir, paths) = test_paths();
        let actor = key("root", "rootkey", Role::Developer);
        for name in ["a", "b", "c"] {
            let target = key(name, name, Role::User);
            append(&paths, &actor, AuditAction::Created, &target).unwrap();
        }

        let entries = list(&paths).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].target_username, "c");
        assert_eq!(entries[2].target_username, "a");
        assert!(entries[0].timestamp >= entries[1].timestamp);
    }

    #[test]
    fn test_missing_log_lists_empty() {
        let (_dir, paths) = test_paths();
        assert!(list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_clear_wipes_and_is_repeatable() {
        let (_dir, paths) = test_paths();
        let actor = key("root", "rootkey", Role::Developer);
        let target = key("alice", "a1", Role::User);
        append(&paths, &actor, AuditAction::Deleted, &target).unwrap();

        clear(&paths).unwrap();
        assert!(list(&paths).unwrap().is_empty());
        clear(&paths).unwrap();
    }

    #[test]
    fn test_chain_verifies_clean() {
        let (_dir, paths) = test_paths();
        let actor = key("root", "rootkey", Role::Developer);
        for name in ["a", "b", "c"] {
            let target = key(name, name, Role::Admin);
            append(&paths, &actor, AuditAction::Created, &target).unwrap();
        }

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        let actor = key("root", "rootkey", Role::Developer);
        append(&paths, &actor, AuditAction::Created, &key("a", "a", Role::User)).unwrap();
        append(&paths, &actor, AuditAction::Deleted, &key("a", "a", Role::User)).unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        let tampered = content.replace("\"deleted\"", "\"created\"");
        fs::write(&paths.audit_log, tampered).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&AuditAction::Created).unwrap(),
            "\"created\""
        );
        assert_eq!(
            serde_json::to_string(&AuditAction::Deleted).unwrap(),
            "\"deleted\""
        );
    }
}
