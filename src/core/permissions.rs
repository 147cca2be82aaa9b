//! Permission engine: pure verdicts for disclosure, deletion, and creation.
//!
//! These three functions are the complete authorization surface. Every
//! mutating or disclosing lifecycle operation consults exactly one of them
//! before touching the store. They perform no I/O and never fail; callers
//! turn a negative verdict into a rejection.

use crate::models::key::AccessKey;
use crate::models::role::Role;

/// May an actor holding `actor_role` see `target`'s secret value?
///
/// Holds exactly when the actor strictly outranks the target: developers
/// see creator/admin/user secrets, creators see admin/user, admins see
/// user. A developer key's secret is never revealed through this path,
/// since no role outranks developer.
pub fn can_view(actor_role: Role, target: &AccessKey) -> bool {
    actor_role.outranks(target.role)
}

/// May the actor delete `target`?
///
/// Self-deletion is always refused, even for developers; past that, the
/// same outranking rule as [`can_view`] decides.
pub fn can_delete(actor_role: Role, actor_value: &str, target: &AccessKey) -> bool {
    target.value != actor_value && can_view(actor_role, target)
}

/// May the actor create a key carrying `requested` role?
///
/// `user` and `admin` keys are grantable by anyone on the admin surface;
/// `creator` keys only by creators and developers; `developer` keys are
/// never grantable through creation.
pub fn can_assign_role(actor_role: Role, requested: Role) -> bool {
    match requested {
        Role::User | Role::Admin => true,
        Role::Creator => matches!(actor_role, Role::Creator | Role::Developer),
        Role::Developer => false,
    }
}
