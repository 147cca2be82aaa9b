//! Typed errors returned by the core engine.
//!
//! The permission engine and role hierarchy are pure and never fail; every
//! other core operation returns one of these variants to its caller. Nothing
//! in the core logs and swallows an error; deciding how each kind is
//! reported is the CLI's job.

use std::path::PathBuf;
use thiserror::Error;

/// Failures from the document store collaborator.
///
/// Always propagated, never retried inside the core. Retry policy belongs
/// to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by authentication and the key lifecycle.
///
/// `InvalidCredentials` and `Expired` concern identity; `Forbidden` concerns
/// authorization. Callers must keep the distinction visible in messaging.
#[derive(Debug, Error)]
pub enum PanelError {
    /// No key matches the presented username/secret pair.
    #[error("invalid access key")]
    InvalidCredentials,

    /// The pair matched a key whose expiry has passed.
    #[error("access key expired")]
    Expired,

    /// The permission engine rejected the operation.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Uniqueness violation on username or key value.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The target id does not resolve to a live record.
    #[error("no key with id or name '{0}'")]
    NotFound(String),

    /// The store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
