//! Environment and secret loading.
//!
//! Configuration for lifecycle scripts is built once per run as an immutable
//! key/value map and passed explicitly to every step. The orchestrator never
//! mutates its own process environment.

use crate::error::{DeployError, Result};
use crate::script::{ScriptRunner, Step, StepOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a dotenv file. A missing file yields an empty map with a warning;
    /// a malformed one is fatal.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!("env file {} not found, continuing without it", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read(path)?;
        let env = Self::parse(&data).map_err(|reason| DeployError::EnvFileInvalid {
            path: path.to_path_buf(),
            reason,
        })?;
        info!(
            "loaded {} variable(s) from {}",
            env.len(),
            path.display()
        );
        Ok(env)
    }

    /// Parse dotenv-formatted bytes (`KEY=VALUE`, `export KEY=VALUE`,
    /// quoting and comments as dotenvy understands them).
    pub fn parse(data: &[u8]) -> std::result::Result<Self, String> {
        let mut vars = BTreeMap::new();
        for item in dotenvy::from_read_iter(data) {
            let (key, value) = item.map_err(|e| e.to_string())?;
            vars.insert(key, value);
        }
        Ok(Self { vars })
    }

    /// Line-by-line parse that keeps every `KEY=VALUE` line and skips the
    /// rest. Returns the 1-based numbers of the skipped lines.
    pub fn parse_lenient(data: &[u8]) -> (Self, Vec<usize>) {
        let mut vars = BTreeMap::new();
        let mut skipped = Vec::new();
        for (idx, line) in String::from_utf8_lossy(data).lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match Self::parse(line.as_bytes()) {
                Ok(env) => vars.extend(env.vars),
                Err(_) => skipped.push(idx + 1),
            }
        }
        (Self { vars }, skipped)
    }

    /// New map with `other`'s entries layered over this one.
    pub fn merged(&self, other: &Environment) -> Environment {
        let mut vars = self.vars.clone();
        vars.extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Run the secret loader under `base` and layer the `KEY=VALUE` lines of its
/// stdout over `base`. Other output (progress messages and the like) is
/// skipped with a warning. `missing` picks the error for an absent loader,
/// which differs between first deploy and redeploy.
pub fn load_secrets(
    runner: &ScriptRunner,
    script: &str,
    base: &Environment,
    missing: fn(String) -> DeployError,
) -> Result<Environment> {
    let step = Step::fatal("secrets", script, missing, DeployError::SecretsFailed).capturing();
    // A FatalOnFailure step turns every failure into Err, so Completed is the
    // only Ok outcome run_step can hand back here.
    let StepOutcome::Completed { stdout } = runner.run_step(&step, base)? else {
        return Err(DeployError::SecretsFailed(format!(
            "{script} did not run to completion"
        )));
    };

    let (secrets, skipped) = Environment::parse_lenient(&stdout);
    if !skipped.is_empty() {
        warn!(
            "secrets: ignored {} line(s) of {script} output that are not KEY=VALUE (lines {})",
            skipped.len(),
            skipped
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    let keys: Vec<&str> = secrets.keys().collect();
    info!("loaded {} secret(s): {}", secrets.len(), keys.join(", "));
    Ok(base.merged(&secrets))
}
