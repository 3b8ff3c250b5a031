use crate::error::{DeployError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ScriptsConfig
// ---------------------------------------------------------------------------

/// Names of the lifecycle scripts inside the bundle, and how to invoke them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_stop")]
    pub stop: String,
    #[serde(default = "default_init")]
    pub init: String,
    #[serde(default = "default_load_secrets")]
    pub load_secrets: String,
    /// Program used to run each script. Empty means exec the script itself.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

fn default_start() -> String {
    paths::START_SCRIPT.to_string()
}

fn default_stop() -> String {
    paths::STOP_SCRIPT.to_string()
}

fn default_init() -> String {
    paths::INIT_SCRIPT.to_string()
}

fn default_load_secrets() -> String {
    paths::SECRETS_SCRIPT.to_string()
}

fn default_interpreter() -> String {
    paths::DEFAULT_INTERPRETER.to_string()
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            stop: default_stop(),
            init: default_init(),
            load_secrets: default_load_secrets(),
            interpreter: default_interpreter(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// Deployment layout. Any path left unset resolves relative to `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_env_file")]
    pub env_file: String,
    /// Top-level app dir entries kept across a redeploy clear.
    #[serde(default = "default_preserve")]
    pub preserve: Vec<String>,
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(paths::DEFAULT_ROOT)
}

fn default_env_file() -> String {
    paths::ENV_FILE.to_string()
}

fn default_preserve() -> Vec<String> {
    vec![paths::ENV_FILE.to_string()]
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::with_root(default_root())
    }
}

impl DeployConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bundle: None,
            app_dir: None,
            backup_dir: None,
            marker: None,
            log_file: None,
            env_file: default_env_file(),
            preserve: default_preserve(),
            scripts: ScriptsConfig::default(),
        }
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .map_err(|e| DeployError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DeployConfig = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject layouts in which clearing or restoring one directory would
    /// destroy the other, the marker or the deploy log.
    pub fn validate(&self) -> Result<()> {
        let app = self.app_dir();
        let backup = self.backup_dir();
        if app == backup || app.starts_with(&backup) || backup.starts_with(&app) {
            return Err(DeployError::Config(format!(
                "app_dir {} and backup_dir {} must not overlap",
                app.display(),
                backup.display()
            )));
        }
        for (name, path) in [("marker", self.marker_path()), ("log_file", self.log_path())] {
            if let Some(dir) = [&app, &backup].into_iter().find(|d| path.starts_with(d)) {
                return Err(DeployError::Config(format!(
                    "{name} {} must live outside {}",
                    path.display(),
                    dir.display()
                )));
            }
        }
        for name in [
            &self.scripts.start,
            &self.scripts.stop,
            &self.scripts.init,
            &self.scripts.load_secrets,
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(DeployError::Config(format!(
                    "script name '{name}' must be a bare file name"
                )));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Resolved paths
    // ---------------------------------------------------------------------------

    pub fn bundle_path(&self) -> PathBuf {
        self.bundle
            .clone()
            .unwrap_or_else(|| paths::bundle_path(&self.root))
    }

    pub fn app_dir(&self) -> PathBuf {
        self.app_dir
            .clone()
            .unwrap_or_else(|| paths::app_dir(&self.root))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| paths::backup_dir(&self.root))
    }

    pub fn marker_path(&self) -> PathBuf {
        self.marker
            .clone()
            .unwrap_or_else(|| paths::marker_path(&self.root))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| paths::log_path(&self.root))
    }

    pub fn env_path(&self) -> PathBuf {
        self.app_dir().join(&self.env_file)
    }
}
