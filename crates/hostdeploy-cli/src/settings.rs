use hostdeploy_core::{paths, DeployConfig, DeployError};
use std::path::{Path, PathBuf};

/// Command-line overrides layered over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub bundle: Option<PathBuf>,
    pub app_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut DeployConfig) {
        if let Some(root) = self.root {
            config.root = root;
        }
        if self.bundle.is_some() {
            config.bundle = self.bundle;
        }
        if self.app_dir.is_some() {
            config.app_dir = self.app_dir;
        }
        if self.backup_dir.is_some() {
            config.backup_dir = self.backup_dir;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
    }
}

/// Resolve the deployment configuration.
///
/// Priority:
/// 1. `--config` flag / `HOSTDEPLOY_CONFIG` env var (must exist)
/// 2. `/etc/hostdeploy/config.yaml` if present
/// 3. Built-in defaults
///
/// Flag overrides are applied last, then the merged layout is validated.
pub fn resolve_config(
    explicit: Option<&Path>,
    overrides: Overrides,
) -> Result<DeployConfig, DeployError> {
    let mut config = match explicit {
        Some(path) if !path.exists() => {
            return Err(DeployError::Config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        Some(path) => DeployConfig::load(path)?,
        None => DeployConfig::load(Path::new(paths::DEFAULT_CONFIG_FILE))?,
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Where the deploy log goes when the configuration itself cannot be
/// loaded: the `--log-file`/`--root` overrides if given, else the default.
pub fn fallback_log_path(root: Option<&Path>, log_file: Option<&Path>) -> PathBuf {
    match (log_file, root) {
        (Some(file), _) => file.to_path_buf(),
        (None, Some(root)) => paths::log_path(root),
        (None, None) => paths::log_path(Path::new(paths::DEFAULT_ROOT)),
    }
}
