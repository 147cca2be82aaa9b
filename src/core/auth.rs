//! Authentication: verify a username/secret pair against the key store.
//!
//! Secrets are compared as plain strings with no hashing at rest and no
//! constant-time guarantee. That preserves the behavior of the panel this
//! replaces and should be treated as a known gap, not a feature.

use crate::core::store::KeyStore;
use crate::error::PanelError;
use crate::models::key::AccessKey;
use chrono::Utc;

/// Look up the key matching `username` and `secret` exactly.
///
/// A miss is `InvalidCredentials`. A hit whose expiry has passed is
/// `Expired`, deliberately distinct so callers can tell a dead key from
/// a wrong one. No side effects: this never creates, mutates, or deletes.
pub fn authenticate(
    store: &KeyStore,
    username: &str,
    secret: &str,
) -> Result<AccessKey, PanelError> {
    let key = store
        .find_login(username, secret)?
        .ok_or(PanelError::InvalidCredentials)?;
    if key.is_expired(Utc::now()) {
        return Err(PanelError::Expired);
    }
    Ok(key)
}
