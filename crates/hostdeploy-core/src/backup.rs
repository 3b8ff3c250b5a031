use crate::error::{DeployError, Result};
use crate::io;
use std::path::Path;
use tracing::info;

/// Replace any previous backup with a fresh copy of `app_dir`.
pub fn snapshot(app_dir: &Path, backup_dir: &Path) -> Result<()> {
    if !app_dir.is_dir() {
        return Err(DeployError::BackupFailed(format!(
            "application directory {} does not exist",
            app_dir.display()
        )));
    }
    io::remove_dir_if_exists(backup_dir)
        .map_err(|e| DeployError::BackupFailed(format!("removing old backup: {e}")))?;
    io::copy_tree(app_dir, backup_dir).map_err(|e| DeployError::BackupFailed(e.to_string()))?;
    info!(
        "backed up {} to {}",
        app_dir.display(),
        backup_dir.display()
    );
    Ok(())
}

/// Wipe `app_dir` and restore the backup's contents verbatim.
pub fn restore(backup_dir: &Path, app_dir: &Path) -> Result<()> {
    if !backup_dir.is_dir() {
        return Err(DeployError::NoBackup(backup_dir.to_path_buf()));
    }
    io::clear_dir(app_dir, &[])?;
    io::copy_tree(backup_dir, app_dir)?;
    info!(
        "restored {} from {}",
        app_dir.display(),
        backup_dir.display()
    );
    Ok(())
}

pub fn exists(backup_dir: &Path) -> bool {
    backup_dir.is_dir()
}
