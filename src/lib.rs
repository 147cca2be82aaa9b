//! Access key panel with a role-gated, audited key lifecycle.
//!
//! Keys are shared secrets with a role attached (developer > creator >
//! admin > user). The permission engine decides who may view, create, or
//! delete which keys; privileged creates and deletes land in a
//! hash-chained audit trail.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Business logic (store, auth, permissions, audit, lifecycle)
//! - `models` — Data structures
//! - `error` — Typed engine errors

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
