//! Operator configuration file model (panel.toml).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub bootstrap: BootstrapSection,
}

/// Overrides for the one-time developer key seeding.
///
/// Seeding only ever runs through `keydesk init --seed`. An empty key
/// collection observed during a normal read stays empty; reseeding on
/// reads would silently resurrect access with a well-known secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapSection {
    /// Username for the seeded developer key.
    #[serde(default)]
    pub seed_username: Option<String>,

    /// Secret for the seeded developer key.
    #[serde(default)]
    pub seed_secret: Option<String>,
}

impl PanelConfig {
    /// Load panel.toml. A missing file is the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("read panel config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse panel config {}", path.display()))
    }
}
