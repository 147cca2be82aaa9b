//! Access key records: the shared secret + role + username triple.

use crate::models::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored access key.
///
/// `username` and `value` are each unique across live keys; the store
/// assigns `id` on insert and it never changes. Secrets are stored and
/// compared as plain strings for compatibility with the panel this
/// replaces: no hashing at rest, no constant-time comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessKey {
    pub id: String,
    pub username: String,
    pub value: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessKey {
    /// Whether the key's expiry, if any, lies before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(t) if t < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(expires_at: Option<DateTime<Utc>>) -> AccessKey {
        AccessKey {
            id: "k1".into(),
            username: "alice".into(),
            value: "a1".into(),
            role: Role::User,
            expires_at,
        }
    }

    #[test]
    fn test_no_expiry_never_expires() {
        assert!(!key(None).is_expired(Utc::now()));
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let now = Utc::now();
        assert!(key(Some(now - Duration::seconds(1))).is_expired(now));
    }

    #[test]
    fn test_future_expiry_is_live() {
        let now = Utc::now();
        assert!(!key(Some(now + Duration::hours(1))).is_expired(now));
    }

    #[test]
    fn test_expiry_field_optional_on_wire() {
        let json = r#"{"id":"1","username":"bob","value":"b1","role":"admin"}"#;
        let parsed: AccessKey = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.role, Role::Admin);
        assert!(parsed.expires_at.is_none());
        // absent expiry is not serialized back out
        assert!(!serde_json::to_string(&parsed).unwrap().contains("expires_at"));
    }
}
