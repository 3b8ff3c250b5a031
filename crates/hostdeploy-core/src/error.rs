use std::path::PathBuf;
use thiserror::Error;

/// Every fatal condition a deployment run can hit. Each variant maps to one
/// stable process exit code via [`DeployError::code`].
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("bundle not found: {}", .0.display())]
    BundleMissing(PathBuf),

    #[error("bundle integrity check failed for {}: {reason}", .path.display())]
    BundleCorrupt { path: PathBuf, reason: String },

    #[error("bundle has no top-level {script}")]
    BundleMissingStart { script: String },

    #[error("failed to prepare application directory {}: {source}", .path.display())]
    AppDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to unpack bundle into {}: {reason}", .dest.display())]
    UnpackFailed { dest: PathBuf, reason: String },

    #[error("secret loader {script} not found in application directory")]
    SecretsLoaderMissing { script: String },

    #[error("secret loader failed: {0}")]
    SecretsFailed(String),

    #[error("init script {script} not found in application directory")]
    InitMissing { script: String },

    #[error("init script failed: {0}")]
    InitFailed(String),

    #[error("failed to write deployment marker {}: {reason}", .path.display())]
    MarkerWrite { path: PathBuf, reason: String },

    #[error("failed to back up application directory: {0}")]
    BackupFailed(String),

    #[error("failed to clear application directory: {0}")]
    ClearFailed(String),

    #[error("failed to unpack new bundle: {0}")]
    RedeployUnpackFailed(String),

    #[error("{script} missing from application directory after unpack")]
    StartMissingAfterUnpack { script: String },

    #[error("secret loader {script} not found after redeploy unpack")]
    RedeploySecretsLoaderMissing { script: String },

    #[error("failed to parse env file {}: {reason}", .path.display())]
    EnvFileInvalid { path: PathBuf, reason: String },

    #[error("start script {script} not found")]
    StartMissing { script: String },

    #[error("start script failed: {0}")]
    StartFailed(String),

    #[error("failed to make {} executable: {source}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rollback failed: {rollback} (original failure: {original})")]
    RollbackFailed { original: String, rollback: String },

    #[error("no backup available at {}", .0.display())]
    NoBackup(PathBuf),

    #[error("nothing deployed yet: marker {} is absent", .0.display())]
    NotDeployed(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DeployError {
    /// Stable exit code for this failure reason.
    pub fn code(&self) -> u8 {
        match self {
            DeployError::BundleMissing(_) => 1,
            DeployError::BundleCorrupt { .. } => 2,
            DeployError::BundleMissingStart { .. } => 3,
            DeployError::AppDirUnavailable { .. } => 4,
            DeployError::UnpackFailed { .. } => 5,
            DeployError::SecretsLoaderMissing { .. } => 6,
            DeployError::SecretsFailed(_) => 7,
            DeployError::InitMissing { .. } => 8,
            DeployError::InitFailed(_) => 9,
            DeployError::MarkerWrite { .. } => 10,
            DeployError::BackupFailed(_) => 11,
            DeployError::ClearFailed(_) => 12,
            DeployError::RedeployUnpackFailed(_) => 13,
            DeployError::StartMissingAfterUnpack { .. } => 14,
            DeployError::RedeploySecretsLoaderMissing { .. } => 15,
            DeployError::EnvFileInvalid { .. } => 16,
            DeployError::StartMissing { .. } => 17,
            DeployError::StartFailed(_) => 18,
            DeployError::PermissionDenied { .. } => 19,
            DeployError::Config(_) | DeployError::Yaml(_) => 20,
            DeployError::RollbackFailed { .. } => 21,
            DeployError::NoBackup(_) | DeployError::NotDeployed(_) | DeployError::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// What happened when a failed redeploy tried to put the previous version back.
#[derive(Debug)]
pub enum RollbackOutcome {
    /// The failure happened before this run touched the application directory.
    NotAttempted,
    /// The backup was restored and restarted.
    Restored,
    /// The snapshot failed after stop; the untouched version was restarted.
    Restarted,
    Failed(DeployError),
}

/// Terminal result of a failed deployment run.
///
/// `recoverable` is true when the failure happened after this run's backup
/// snapshot completed, which is the only window in which rollback applies.
#[derive(Debug)]
pub struct Failure {
    pub error: DeployError,
    pub recoverable: bool,
    pub rollback: RollbackOutcome,
}

impl Failure {
    pub fn fatal(error: DeployError) -> Self {
        Self {
            error,
            recoverable: false,
            rollback: RollbackOutcome::NotAttempted,
        }
    }

    pub fn recoverable(error: DeployError) -> Self {
        Self {
            error,
            recoverable: true,
            rollback: RollbackOutcome::NotAttempted,
        }
    }

    pub fn code(&self) -> u8 {
        self.error.code()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Exit code the process should terminate with. A failed rollback
    /// escalates over the original failure code.
    pub fn exit_code(&self) -> u8 {
        match &self.rollback {
            RollbackOutcome::Failed(e) => e.code(),
            _ => self.code(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.error)?;
        match &self.rollback {
            RollbackOutcome::NotAttempted => Ok(()),
            RollbackOutcome::Restored => write!(f, " (previous version restored)"),
            RollbackOutcome::Restarted => write!(f, " (previous version restarted)"),
            RollbackOutcome::Failed(e) => write!(f, " ({e})"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
