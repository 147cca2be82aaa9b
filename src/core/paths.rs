//! Panel path resolution and on-disk layout.

use crate::constants;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PanelPaths {
    pub root: PathBuf,
    pub keys_file: PathBuf,
    pub servers_file: PathBuf,
    pub settings_file: PathBuf,
    pub audit_log: PathBuf,
    pub store_lock: PathBuf,
    pub audit_lock: PathBuf,
    pub panel_toml: PathBuf,
}

impl PanelPaths {
    /// Resolve the panel root from CLI arg, env var, or the default.
    pub fn resolve(root_arg: Option<PathBuf>) -> Self {
        if let Some(root) = root_arg {
            return Self::from_root(root);
        }
        if let Ok(root) = env::var("KEYDESK_ROOT") {
            return Self::from_root(PathBuf::from(root));
        }
        Self::from_root(PathBuf::from(constants::DEFAULT_PANEL_ROOT))
    }

    /// Create panel paths from a root directory.
    pub fn from_root(root: PathBuf) -> Self {
        let keys_file = root.join("keys.json");
        let servers_file = root.join("servers.json");
        let settings_file = root.join("settings.json");
        let audit_log = root.join("audit.log");
        let store_lock = root.join("store.lock");
        let audit_lock = root.join("audit.lock");
        let panel_toml = root.join("panel.toml");
        Self {
            root,
            keys_file,
            servers_file,
            settings_file,
            audit_log,
            store_lock,
            audit_lock,
            panel_toml,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root() {
        let paths = PanelPaths::from_root(PathBuf::from("/test"));
        assert_eq!(paths.root, PathBuf::from("/test"));
        assert_eq!(paths.keys_file, PathBuf::from("/test/keys.json"));
        assert_eq!(paths.servers_file, PathBuf::from("/test/servers.json"));
        assert_eq!(paths.settings_file, PathBuf::from("/test/settings.json"));
        assert_eq!(paths.audit_log, PathBuf::from("/test/audit.log"));
        assert_eq!(paths.store_lock, PathBuf::from("/test/store.lock"));
        assert_eq!(paths.audit_lock, PathBuf::from("/test/audit.lock"));
        assert_eq!(paths.panel_toml, PathBuf::from("/test/panel.toml"));
    }
}
