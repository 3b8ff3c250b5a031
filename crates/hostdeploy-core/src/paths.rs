use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

pub const DEFAULT_ROOT: &str = "/opt/app";
pub const DEFAULT_CONFIG_FILE: &str = "/etc/hostdeploy/config.yaml";

pub const BUNDLE_FILE: &str = "upload/bundle.tar.gz";
pub const APP_DIR: &str = "current";
pub const BACKUP_DIR: &str = "backup";
pub const MARKER_FILE: &str = ".deployed";
pub const LOG_FILE: &str = "deploy.log";

pub const ENV_FILE: &str = ".env";

pub const START_SCRIPT: &str = "start.sh";
pub const STOP_SCRIPT: &str = "stop.sh";
pub const INIT_SCRIPT: &str = "init.sh";
pub const SECRETS_SCRIPT: &str = "load-secrets.sh";
pub const DEFAULT_INTERPRETER: &str = "/bin/sh";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn bundle_path(root: &Path) -> PathBuf {
    root.join(BUNDLE_FILE)
}

pub fn app_dir(root: &Path) -> PathBuf {
    root.join(APP_DIR)
}

pub fn backup_dir(root: &Path) -> PathBuf {
    root.join(BACKUP_DIR)
}

pub fn marker_path(root: &Path) -> PathBuf {
    root.join(MARKER_FILE)
}

pub fn log_path(root: &Path) -> PathBuf {
    root.join(LOG_FILE)
}

/// Normalise a tar entry path for comparison against top-level names:
/// strips any leading `./` components.
pub fn normalize_entry(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
