//! Lifecycle script invocation.
//!
//! Scripts live at the top of the application directory and are run with the
//! app dir as their working directory. Each step carries a [`StepPolicy`]
//! that decides whether a missing or failing script aborts the run or only
//! logs a warning; [`ScriptRunner::run_step`] is the single place that policy
//! is applied.

use crate::env::Environment;
use crate::error::DeployError;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Step definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum StepPolicy {
    /// A missing or failing script aborts the run with the step's own error.
    FatalOnFailure {
        missing: fn(String) -> DeployError,
        failed: fn(String) -> DeployError,
    },
    /// A missing or failing script is logged and the run continues.
    WarnOnFailure,
}

/// One lifecycle step: which script, and how to treat its failure.
#[derive(Debug, Clone)]
pub struct Step<'a> {
    pub label: &'static str,
    pub script: &'a str,
    pub policy: StepPolicy,
    pub capture_stdout: bool,
}

impl<'a> Step<'a> {
    pub fn fatal(
        label: &'static str,
        script: &'a str,
        missing: fn(String) -> DeployError,
        failed: fn(String) -> DeployError,
    ) -> Self {
        Self {
            label,
            script,
            policy: StepPolicy::FatalOnFailure { missing, failed },
            capture_stdout: false,
        }
    }

    pub fn best_effort(label: &'static str, script: &'a str) -> Self {
        Self {
            label,
            script,
            policy: StepPolicy::WarnOnFailure,
            capture_stdout: false,
        }
    }

    /// Capture the script's stdout instead of sending it to the log.
    pub fn capturing(mut self) -> Self {
        self.capture_stdout = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed { stdout: Vec<u8> },
    /// Script absent. Only produced under `WarnOnFailure`.
    Skipped,
    /// Script failed. Only produced under `WarnOnFailure`.
    Failed(String),
}

impl StepOutcome {
    pub fn completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }
}

#[derive(Debug)]
enum ScriptError {
    Missing,
    Permission(std::io::Error),
    Spawn(std::io::Error),
    Output(std::io::Error),
    Exit(ExitStatus),
}

// ---------------------------------------------------------------------------
// ScriptRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    app_dir: PathBuf,
    interpreter: Option<String>,
    log_file: Option<PathBuf>,
    vars: Vec<(String, String)>,
}

impl ScriptRunner {
    /// `interpreter` empty means the script is exec'd directly.
    pub fn new(app_dir: impl Into<PathBuf>, interpreter: &str) -> Self {
        Self {
            app_dir: app_dir.into(),
            interpreter: (!interpreter.is_empty()).then(|| interpreter.to_string()),
            log_file: None,
            vars: Vec::new(),
        }
    }

    /// Append script stdout/stderr to this file instead of inheriting the
    /// parent's streams. A file handle rather than a pipe, so children that
    /// daemonize cannot hold the run open.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Extra variable set for every script on top of the step environment.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn script_path(&self, script: &str) -> PathBuf {
        self.app_dir.join(script)
    }

    pub fn exists(&self, script: &str) -> bool {
        self.script_path(script).is_file()
    }

    /// Run a step, applying its policy to any failure.
    pub fn run_step(&self, step: &Step<'_>, env: &Environment) -> Result<StepOutcome, DeployError> {
        info!("{}: running {}", step.label, step.script);
        let err = match self.invoke(step.script, env, step.capture_stdout) {
            Ok(stdout) => {
                info!("{}: {} completed", step.label, step.script);
                return Ok(StepOutcome::Completed { stdout });
            }
            Err(e) => e,
        };

        match (step.policy, err) {
            (StepPolicy::FatalOnFailure { missing, .. }, ScriptError::Missing) => {
                Err(missing(step.script.to_string()))
            }
            (StepPolicy::FatalOnFailure { .. }, ScriptError::Permission(source)) => {
                Err(DeployError::PermissionDenied {
                    path: self.script_path(step.script),
                    source,
                })
            }
            (StepPolicy::FatalOnFailure { failed, .. }, other) => {
                Err(failed(describe(step.script, &other)))
            }
            (StepPolicy::WarnOnFailure, ScriptError::Missing) => {
                warn!("{}: {} not found, continuing", step.label, step.script);
                Ok(StepOutcome::Skipped)
            }
            (StepPolicy::WarnOnFailure, other) => {
                let reason = describe(step.script, &other);
                warn!("{}: {reason}, continuing", step.label);
                Ok(StepOutcome::Failed(reason))
            }
        }
    }

    fn invoke(
        &self,
        script: &str,
        env: &Environment,
        capture: bool,
    ) -> Result<Vec<u8>, ScriptError> {
        let path = self.script_path(script);
        if !path.is_file() {
            return Err(ScriptError::Missing);
        }
        make_executable(&path).map_err(ScriptError::Permission)?;

        let mut cmd = match &self.interpreter {
            Some(interp) => {
                let mut cmd = Command::new(interp);
                cmd.arg(&path);
                cmd
            }
            None => Command::new(&path),
        };
        cmd.current_dir(&self.app_dir);
        cmd.stdin(Stdio::null());
        cmd.envs(env.iter());
        cmd.envs(self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let (out, err) = self.sinks().map_err(ScriptError::Spawn)?;
        cmd.stderr(err);

        if capture {
            // Unnamed temp file rather than a pipe: a daemon the script
            // leaves behind holding stdout cannot block the run.
            let mut buf = tempfile::tempfile().map_err(ScriptError::Output)?;
            cmd.stdout(buf.try_clone().map_err(ScriptError::Output)?);
            let status = cmd.status().map_err(ScriptError::Spawn)?;
            if !status.success() {
                return Err(ScriptError::Exit(status));
            }
            let mut stdout = Vec::new();
            buf.seek(SeekFrom::Start(0))
                .and_then(|_| buf.read_to_end(&mut stdout))
                .map_err(ScriptError::Output)?;
            Ok(stdout)
        } else {
            cmd.stdout(out);
            let status = cmd.status().map_err(ScriptError::Spawn)?;
            if !status.success() {
                return Err(ScriptError::Exit(status));
            }
            Ok(Vec::new())
        }
    }

    fn sinks(&self) -> std::io::Result<(Stdio, Stdio)> {
        match &self.log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let dup = file.try_clone()?;
                Ok((Stdio::from(file), Stdio::from(dup)))
            }
            None => Ok((Stdio::inherit(), Stdio::inherit())),
        }
    }
}

/// Grant execute permission to owner, group and other, keeping other bits.
fn make_executable(path: &Path) -> std::io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)
}

fn describe(script: &str, err: &ScriptError) -> String {
    match err {
        ScriptError::Missing => format!("{script} not found"),
        ScriptError::Permission(e) => format!("could not make {script} executable: {e}"),
        ScriptError::Spawn(e) => format!("could not launch {script}: {e}"),
        ScriptError::Output(e) => format!("could not collect output of {script}: {e}"),
        ScriptError::Exit(status) => format!("{script} exited with {status}"),
    }
}
