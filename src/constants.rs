//! Centralized constants for defaults, file modes, and limits.

/// Default panel root directory.
pub const DEFAULT_PANEL_ROOT: &str = "/opt/services/keydesk";

/// Permission mode for store document files.
pub const STORE_FILE_MODE: u32 = 0o600;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o640;

/// Permission mode for the panel root directory.
pub const PANEL_DIR_MODE: u32 = 0o700;

/// Maximum secret size in bytes. Access keys are short shared secrets.
pub const MAX_SECRET_SIZE: usize = 4096;

/// Length of auto-generated key values.
pub const DEFAULT_GENERATED_KEY_LENGTH: usize = 32;

/// Number of random bytes in a document id (rendered as hex).
pub const DOC_ID_BYTES: usize = 12;

/// Username for the bootstrap developer key when panel.toml has no override.
pub const SEED_USERNAME: &str = "root";

/// Secret for the bootstrap developer key when panel.toml has no override.
/// Deployments should override this in panel.toml and rotate after first login.
pub const SEED_SECRET: &str = "rootkey";
