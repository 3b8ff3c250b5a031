//! Bundle validation and unpacking.
//!
//! A bundle is a gzip-compressed tar archive. Validation streams the whole
//! archive once: every header and body must be readable and the gzip trailer
//! checksum must match. Nothing on disk is touched until validation passes.

use crate::error::{DeployError, Result};
use crate::paths;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A bundle that passed validation.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub path: PathBuf,
    pub sha256: String,
    pub entries: usize,
}

/// Confirm the bundle exists, is a readable archive, and carries
/// `start_script` at its top level.
pub fn validate(path: &Path, start_script: &str) -> Result<Bundle> {
    if !path.is_file() {
        return Err(DeployError::BundleMissing(path.to_path_buf()));
    }

    let corrupt = |reason: String| DeployError::BundleCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| corrupt(e.to_string()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut entries = 0usize;
    let mut has_start = false;

    for entry in archive.entries().map_err(|e| corrupt(e.to_string()))? {
        let mut entry = entry.map_err(|e| corrupt(e.to_string()))?;
        let entry_path = entry.path().map_err(|e| corrupt(e.to_string()))?;
        if paths::normalize_entry(&entry_path) == Path::new(start_script)
            && entry.header().entry_type().is_file()
        {
            has_start = true;
        }
        std::io::copy(&mut entry, &mut std::io::sink()).map_err(|e| corrupt(e.to_string()))?;
        entries += 1;
    }

    // tar stops at the end-of-archive blocks; drain the rest so the gzip
    // trailer CRC is verified.
    let mut decoder = archive.into_inner();
    std::io::copy(&mut decoder, &mut std::io::sink()).map_err(|e| corrupt(e.to_string()))?;

    if !has_start {
        return Err(DeployError::BundleMissingStart {
            script: start_script.to_string(),
        });
    }

    let sha256 = digest(path).map_err(|e| corrupt(e.to_string()))?;
    debug!(bundle = %path.display(), entries, %sha256, "bundle validated");

    Ok(Bundle {
        path: path.to_path_buf(),
        sha256,
        entries,
    })
}

/// Unpack a bundle into `dest`, creating it if missing. Entries that would
/// escape `dest` are rejected by the tar crate.
pub fn unpack(bundle: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    let file = File::open(bundle)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive.unpack(dest)
}

/// Hex SHA-256 of a file.
pub fn digest(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
