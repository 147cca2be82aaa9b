//! Pass-through records for the dispatch registry.
//!
//! These are undifferentiated documents: the core stores them verbatim and
//! applies no invariants beyond the CLI's admin gate. Formatting and
//! delivery of dispatched commands happen outside this crate.

use serde::{Deserialize, Serialize};

/// A server the panel can dispatch commands to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTemplate {
    pub id: String,
    pub server_name: String,
    pub command_format: String,
}

/// Connection settings for the outbound messaging collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}
