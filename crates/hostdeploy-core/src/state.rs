use crate::error::{DeployError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// DeploymentState
// ---------------------------------------------------------------------------

/// Two-state machine persisted as the presence of the marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Fresh,
    Deployed,
}

impl DeploymentState {
    pub fn detect(marker: &Path) -> Self {
        if marker.exists() {
            DeploymentState::Deployed
        } else {
            DeploymentState::Fresh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Fresh => "fresh",
            DeploymentState::Deployed => "deployed",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MarkerRecord
// ---------------------------------------------------------------------------

/// Informational contents of the marker file. Only its presence is state;
/// a marker that fails to parse still means `Deployed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub deployed_at: DateTime<Utc>,
    pub bundle_sha256: String,
}

fn default_version() -> u32 {
    1
}

impl MarkerRecord {
    pub fn new(bundle_sha256: impl Into<String>) -> Self {
        Self {
            version: 1,
            deployed_at: Utc::now(),
            bundle_sha256: bundle_sha256.into(),
        }
    }

    /// Write the marker. Fails if it already exists: the fresh → deployed
    /// transition happens once.
    pub fn create(&self, marker: &Path) -> Result<()> {
        if marker.exists() {
            return Err(DeployError::MarkerWrite {
                path: marker.to_path_buf(),
                reason: "marker already exists".to_string(),
            });
        }
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(marker, data.as_bytes()).map_err(|e| DeployError::MarkerWrite {
            path: marker.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn load(marker: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(marker).ok()?;
        serde_yaml::from_str(&data).ok()
    }
}
