//! Key lifecycle orchestration: the only mutation path for access keys.
//!
//! Every operation takes an already-authenticated actor, asks the
//! permission engine for a verdict, and only then touches the store.
//! Creates and deletes land in the audit trail; rotation and disclosure
//! deliberately do not. Each call is independent: no session state lives
//! here beyond the actor the caller resolved.

use crate::constants;
use crate::core::audit_log::{self, AuditAction};
use crate::core::paths::PanelPaths;
use crate::core::permissions;
use crate::core::store::KeyStore;
use crate::error::PanelError;
use crate::models::config::PanelConfig;
use crate::models::key::AccessKey;
use crate::models::role::Role;
use chrono::{DateTime, Utc};

/// Result of a delete request. An absent target is success, not failure,
/// so deletes stay safe to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { username: String },
    AlreadyGone,
}

/// Create a new access key on behalf of `actor`.
///
/// Conflicts (empty or already-taken username/value) are checked before
/// the role verdict. The audit entry is written only after the key has
/// been persisted; a failed insert must not leave a phantom entry.
pub fn add_key(
    paths: &PanelPaths,
    actor: &AccessKey,
    username: &str,
    value: &str,
    role: Role,
    expires_at: Option<DateTime<Utc>>,
) -> Result<AccessKey, PanelError> {
    if username.trim().is_empty() {
        return Err(PanelError::Conflict("username cannot be empty".into()));
    }
    if value.is_empty() {
        return Err(PanelError::Conflict("key value cannot be empty".into()));
    }

    let store = KeyStore::open(paths);
    let keys = store.list()?;
    if keys.iter().any(|k| k.username == username) {
        return Err(PanelError::Conflict(format!(
            "username '{}' already exists",
            username
        )));
    }
    if keys.iter().any(|k| k.value == value) {
        return Err(PanelError::Conflict("key value already in use".into()));
    }

    if !permissions::can_assign_role(actor.role, role) {
        return Err(PanelError::Forbidden("role not assignable by this actor"));
    }

    let key = store.insert(username, value, role, expires_at)?;
    audit_log::append(paths, actor, AuditAction::Created, &key)?;
    Ok(key)
}

/// Delete the key with `target_id` on behalf of `actor`.
///
/// The audit entry snapshots the target's username and role before the
/// record disappears; order matters.
pub fn delete_key(
    paths: &PanelPaths,
    actor: &AccessKey,
    target_id: &str,
) -> Result<DeleteOutcome, PanelError> {
    let store = KeyStore::open(paths);
    let target = match store.find_by_id(target_id)? {
        Some(target) => target,
        None => return Ok(DeleteOutcome::AlreadyGone),
    };

    if !permissions::can_delete(actor.role, &actor.value, &target) {
        return Err(PanelError::Forbidden("not permitted to delete this key"));
    }

    audit_log::append(paths, actor, AuditAction::Deleted, &target)?;
    store.delete(target_id)?;
    Ok(DeleteOutcome::Deleted {
        username: target.username,
    })
}

/// Replace the actor's own key value in place; id, username, and role are
/// untouched.
///
/// Self-service, so no audit entry. The secret the actor just
/// authenticated with stops working the moment this returns; callers
/// must treat the current session as finished.
pub fn rotate_key(paths: &PanelPaths, actor: &AccessKey, new_value: &str) -> Result<(), PanelError> {
    if new_value.is_empty() {
        return Err(PanelError::Conflict("key value cannot be empty".into()));
    }

    let store = KeyStore::open(paths);
    if store
        .list()?
        .iter()
        .any(|k| k.value == new_value && k.id != actor.id)
    {
        return Err(PanelError::Conflict("key value already in use".into()));
    }

    if !store.update_value(&actor.id, new_value)? {
        return Err(PanelError::NotFound(actor.id.clone()));
    }
    Ok(())
}

/// Reveal the secret value of the key with `target_id`.
///
/// Pure read; disclosure is not logged in this design.
pub fn reveal_key(
    paths: &PanelPaths,
    actor: &AccessKey,
    target_id: &str,
) -> Result<String, PanelError> {
    let store = KeyStore::open(paths);
    let target = store
        .find_by_id(target_id)?
        .ok_or_else(|| PanelError::NotFound(target_id.to_string()))?;

    if !permissions::can_view(actor.role, &target) {
        return Err(PanelError::Forbidden("not permitted to view this key"));
    }
    Ok(target.value)
}

/// Admin-surface listing of all keys. User-role actors have no key
/// administration view.
pub fn list_keys(paths: &PanelPaths, actor: &AccessKey) -> Result<Vec<AccessKey>, PanelError> {
    if actor.role == Role::User {
        return Err(PanelError::Forbidden(
            "key administration requires an admin role",
        ));
    }
    let store = KeyStore::open(paths);
    Ok(store.list()?)
}

/// Wipe the audit trail. The developer-only check lives here; the audit
/// service itself is mechanism, not authorization.
pub fn clear_history(paths: &PanelPaths, actor: &AccessKey) -> Result<(), PanelError> {
    if actor.role != Role::Developer {
        return Err(PanelError::Forbidden(
            "clearing history requires the developer role",
        ));
    }
    audit_log::clear(paths)?;
    Ok(())
}

/// One-time bootstrap: seed a developer key iff the key collection is
/// empty.
///
/// Runs only from `init --seed`, an explicit operator action. There is no
/// actor yet, so this bypasses the permission engine and writes no audit
/// entry. Normal reads never seed.
pub fn seed(paths: &PanelPaths, config: &PanelConfig) -> Result<Option<AccessKey>, PanelError> {
    let store = KeyStore::open(paths);
    if !store.list()?.is_empty() {
        return Ok(None);
    }

    let username = config
        .bootstrap
        .seed_username
        .as_deref()
        .unwrap_or(constants::SEED_USERNAME);
    let secret = config
        .bootstrap
        .seed_secret
        .as_deref()
        .unwrap_or(constants::SEED_SECRET);

    let key = store.insert(username, secret, Role::Developer, None)?;
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, PanelPaths) {
        let dir = TempDir::new().unwrap();
        let paths = PanelPaths::from_root(dir.path().to_path_buf());
        (dir, paths)
    }

    fn insert(paths: &PanelPaths, username: &str, value: &str, role: Role) -> AccessKey {
        KeyStore::open(paths)
            .insert(username, value, role, None)
            .unwrap()
    }

    #[test]
    fn test_seed_then_add_produces_one_created_entry() {
        // end-to-end: seed root, authenticate, create alice, check the trail
        let (_dir, paths) = test_paths();
        let seeded = seed(&paths, &PanelConfig::default()).unwrap().unwrap();
        assert_eq!(seeded.username, "root");
        assert_eq!(seeded.role, Role::Developer);

        let store = KeyStore::open(&paths);
        let actor = auth::authenticate(&store, "root", "rootkey").unwrap();
        assert_eq!(actor.role, Role::Developer);

        let alice = add_key(&paths, &actor, "alice", "a1", Role::User, None).unwrap();
        assert_eq!(alice.username, "alice");

        let entries = audit_log::list(&paths).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Created);
        assert_eq!(entries[0].actor_username, "root");
        assert_eq!(entries[0].target_username, "alice");
        assert_eq!(entries[0].target_role, Role::User);
    }

    #[test]
    fn test_seed_is_a_noop_when_keys_exist() {
        let (_dir, paths) = test_paths();
        insert(&paths, "alice", "a1", Role::User);
        assert!(seed(&paths, &PanelConfig::default()).unwrap().is_none());
        assert_eq!(KeyStore::open(&paths).list().unwrap().len(), 1);
    }

    #[test]
    fn test_seed_honors_config_overrides() {
        let (_dir, paths) = test_paths();
        let mut config = PanelConfig::default();
        config.bootstrap.seed_username = Some("ops".into());
        config.bootstrap.seed_secret = Some("opskey".into());

        let key = seed(&paths, &config).unwrap().unwrap();
        assert_eq!(key.username, "ops");
        assert_eq!(key.value, "opskey");
    }

    #[test]
    fn test_add_rejects_duplicates_and_empties() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "root", "rootkey", Role::Developer);
        add_key(&paths, &actor, "alice", "a1", Role::User, None).unwrap();

        for (username, value) in [("alice", "fresh"), ("fresh", "a1"), ("", "x"), ("x", "")] {
            assert!(matches!(
                add_key(&paths, &actor, username, value, Role::User, None),
                Err(PanelError::Conflict(_))
            ));
        }
        // conflicts must not have produced extra audit entries
        assert_eq!(audit_log::list(&paths).unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_unassignable_roles() {
        let (_dir, paths) = test_paths();
        let admin = insert(&paths, "adm", "adm1", Role::Admin);

        assert!(matches!(
            add_key(&paths, &admin, "c", "c1", Role::Creator, None),
            Err(PanelError::Forbidden(_))
        ));
        assert!(matches!(
            add_key(&paths, &admin, "d", "d1", Role::Developer, None),
            Err(PanelError::Forbidden(_))
        ));
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_id_is_idempotent_success() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "root", "rootkey", Role::Developer);

        let outcome = delete_key(&paths, &actor, "no-such-id").unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyGone);
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_delete_snapshots_target_before_removal() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "root", "rootkey", Role::Developer);
        let target = insert(&paths, "alice", "a1", Role::Admin);

        let outcome = delete_key(&paths, &actor, &target.id).unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Deleted {
                username: "alice".into()
            }
        );
        assert!(KeyStore::open(&paths).find_by_id(&target.id).unwrap().is_none());

        let entries = audit_log::list(&paths).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Deleted);
        assert_eq!(entries[0].target_username, "alice");
        assert_eq!(entries[0].target_role, Role::Admin);
    }

    #[test]
    fn test_admin_cannot_delete_admin() {
        // end-to-end: verdict negative, store unchanged, no audit entry
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "adm1", "v1", Role::Admin);
        let target = insert(&paths, "adm2", "v2", Role::Admin);

        assert!(matches!(
            delete_key(&paths, &actor, &target.id),
            Err(PanelError::Forbidden(_))
        ));
        assert_eq!(KeyStore::open(&paths).list().unwrap().len(), 2);
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_no_self_delete() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "root", "rootkey", Role::Developer);

        assert!(matches!(
            delete_key(&paths, &actor, &actor.id),
            Err(PanelError::Forbidden(_))
        ));
    }

    #[test]
    fn test_rotation_invalidates_old_secret_silently() {
        // end-to-end: a1 -> a2, old secret dead, new live, no audit entry
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "alice", "a1", Role::Admin);

        rotate_key(&paths, &actor, "a2").unwrap();

        let store = KeyStore::open(&paths);
        assert!(matches!(
            auth::authenticate(&store, "alice", "a1"),
            Err(PanelError::InvalidCredentials)
        ));
        let rotated = auth::authenticate(&store, "alice", "a2").unwrap();
        assert_eq!(rotated.id, actor.id);
        assert_eq!(rotated.role, Role::Admin);
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_rotation_to_taken_value_changes_nothing() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "alice", "a1", Role::Admin);
        insert(&paths, "bob", "b1", Role::User);

        assert!(matches!(
            rotate_key(&paths, &actor, "b1"),
            Err(PanelError::Conflict(_))
        ));

        let store = KeyStore::open(&paths);
        assert_eq!(store.find_by_id(&actor.id).unwrap().unwrap().value, "a1");
        assert!(store.find_login("bob", "b1").unwrap().is_some());
    }

    #[test]
    fn test_rotation_to_own_current_value_is_allowed() {
        let (_dir, paths) = test_paths();
        let actor = insert(&paths, "alice", "a1", Role::Admin);
        rotate_key(&paths, &actor, "a1").unwrap();
    }

    #[test]
    fn test_reveal_respects_view_verdict() {
        let (_dir, paths) = test_paths();
        let admin = insert(&paths, "adm", "adm1", Role::Admin);
        let user = insert(&paths, "alice", "a1", Role::User);
        let peer = insert(&paths, "adm2", "adm2v", Role::Admin);

        assert_eq!(reveal_key(&paths, &admin, &user.id).unwrap(), "a1");
        assert!(matches!(
            reveal_key(&paths, &admin, &peer.id),
            Err(PanelError::Forbidden(_))
        ));
        assert!(matches!(
            reveal_key(&paths, &admin, "no-such-id"),
            Err(PanelError::NotFound(_))
        ));
        // disclosure never hits the trail
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_list_keys_is_closed_to_user_role() {
        let (_dir, paths) = test_paths();
        let user = insert(&paths, "alice", "a1", Role::User);
        let admin = insert(&paths, "adm", "adm1", Role::Admin);

        assert!(matches!(
            list_keys(&paths, &user),
            Err(PanelError::Forbidden(_))
        ));
        assert_eq!(list_keys(&paths, &admin).unwrap().len(), 2);
    }

    #[test]
    fn test_clear_history_is_developer_only() {
        let (_dir, paths) = test_paths();
        let dev = insert(&paths, "root", "rootkey", Role::Developer);
        let creator = insert(&paths, "cr", "cr1", Role::Creator);
        add_key(&paths, &dev, "alice", "a1", Role::User, None).unwrap();
        assert_eq!(audit_log::list(&paths).unwrap().len(), 1);

        assert!(matches!(
            clear_history(&paths, &creator),
            Err(PanelError::Forbidden(_))
        ));
        assert_eq!(audit_log::list(&paths).unwrap().len(), 1);

        clear_history(&paths, &dev).unwrap();
        assert!(audit_log::list(&paths).unwrap().is_empty());
    }
}
