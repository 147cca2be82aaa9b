//! Role hierarchy: the four capability levels and their privilege order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability level carried by an access key.
///
/// Privilege order, highest first: `developer > creator > admin > user`.
/// The order is consulted only through [`Role::outranks`]; nothing else in
/// the crate re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Creator,
    Admin,
    User,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Role::Developer => 3,
            Role::Creator => 2,
            Role::Admin => 1,
            Role::User => 0,
        }
    }

    /// Whether `self` strictly outranks `other`. Irreflexive.
    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    /// Parse the lowercase wire name of a role.
    pub fn from_name(s: &str) -> Option<Role> {
        match s {
            "developer" => Some(Role::Developer),
            "creator" => Some(Role::Creator),
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Lowercase wire name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Creator => "creator",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
