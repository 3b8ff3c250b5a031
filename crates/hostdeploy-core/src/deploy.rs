//! The deployment state machine.
//!
//! ```text
//! FRESH    --valid bundle--> unpack, env, secrets, init, mark     --> DEPLOYED
//! DEPLOYED --valid bundle--> stop?, backup, clear, unpack, env, secrets --> DEPLOYED
//! either   --start-------->  start.sh
//! ```
//!
//! Validation always runs first, so an invalid bundle never touches the
//! application directory. Failures after this run's backup completes roll
//! the application directory back to that backup and restart it. A failed
//! backup leaves the tree untouched, so the stopped version is restarted
//! in place.

use crate::backup;
use crate::bundle::{self, Bundle};
use crate::config::DeployConfig;
use crate::env::{self, Environment};
use crate::error::{DeployError, Failure, Result, RollbackOutcome};
use crate::io;
use crate::script::{ScriptRunner, Step, StepOutcome};
use crate::state::{DeploymentState, MarkerRecord};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub previous_state: DeploymentState,
    pub bundle_sha256: String,
    /// Whether a stop script ran to completion before the swap.
    pub stopped: bool,
    pub variables: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub state: DeploymentState,
    pub app_dir: PathBuf,
    pub bundle: PathBuf,
    pub bundle_present: bool,
    pub backup_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerRecord>,
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

pub struct Deployer {
    config: DeployConfig,
}

impl Deployer {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn state(&self) -> DeploymentState {
        DeploymentState::detect(&self.config.marker_path())
    }

    pub fn status(&self) -> Status {
        let marker = self.config.marker_path();
        let bundle = self.config.bundle_path();
        Status {
            state: DeploymentState::detect(&marker),
            app_dir: self.config.app_dir(),
            bundle_present: bundle.is_file(),
            bundle,
            backup_present: backup::exists(&self.config.backup_dir()),
            marker: MarkerRecord::load(&marker),
        }
    }

    /// Validate the configured bundle without touching anything else.
    pub fn validate(&self) -> Result<Bundle> {
        bundle::validate(&self.config.bundle_path(), &self.config.scripts.start)
    }

    /// Run one deployment to completion or to a terminal failure.
    pub fn run(&self) -> std::result::Result<DeployReport, Failure> {
        info!("deployment starting");
        let bundle = self.validate().map_err(Failure::fatal)?;
        info!(
            "bundle {} validated ({} entries, sha256 {})",
            bundle.path.display(),
            bundle.entries,
            bundle.sha256
        );

        let state = self.state();
        info!("deployment state: {state}");
        let report = match state {
            DeploymentState::Fresh => self.first_deploy(&bundle),
            DeploymentState::Deployed => self.redeploy(&bundle),
        }?;
        info!("deployment complete");
        Ok(report)
    }

    /// Restore the last backup and restart it, outside of a deploy run.
    pub fn rollback(&self) -> Result<()> {
        let marker = self.config.marker_path();
        if DeploymentState::detect(&marker) != DeploymentState::Deployed {
            return Err(DeployError::NotDeployed(marker));
        }
        let backup_dir = self.config.backup_dir();
        if !backup::exists(&backup_dir) {
            return Err(DeployError::NoBackup(backup_dir));
        }
        info!("manual rollback requested");
        let runner = self.runner(DeploymentState::Deployed);
        self.stop(&runner);
        self.restore_and_restart()
    }

    // ---------------------------------------------------------------------------
    // First deploy
    // ---------------------------------------------------------------------------

    fn first_deploy(&self, bundle: &Bundle) -> std::result::Result<DeployReport, Failure> {
        let runner = self.runner(DeploymentState::Fresh);
        let env = self
            .install_fresh(bundle, &runner)
            .and_then(|env| {
                self.start(&runner, &env)?;
                Ok(env)
            })
            .map_err(Failure::fatal)?;

        Ok(DeployReport {
            previous_state: DeploymentState::Fresh,
            bundle_sha256: bundle.sha256.clone(),
            stopped: false,
            variables: env.len(),
            backup_dir: None,
        })
    }

    fn install_fresh(&self, bundle: &Bundle, runner: &ScriptRunner) -> Result<Environment> {
        let app_dir = self.config.app_dir();
        info!("first deployment into {}", app_dir.display());
        std::fs::create_dir_all(&app_dir).map_err(|source| DeployError::AppDirUnavailable {
            path: app_dir.clone(),
            source,
        })?;
        // Leftovers of an earlier failed first deploy must not stand in for
        // scripts this bundle lacks.
        if io::has_entries(&app_dir) {
            warn!(
                "application directory {} is not empty, clearing it",
                app_dir.display()
            );
            io::clear_dir(&app_dir, &self.config.preserve).map_err(|e| {
                DeployError::AppDirUnavailable {
                    path: app_dir.clone(),
                    source: std::io::Error::other(e.to_string()),
                }
            })?;
        }

        bundle::unpack(&bundle.path, &app_dir).map_err(|e| DeployError::UnpackFailed {
            dest: app_dir.clone(),
            reason: e.to_string(),
        })?;
        info!("bundle unpacked");

        let env = self.load_env(runner, |script| DeployError::SecretsLoaderMissing {
            script,
        })?;

        let init = Step::fatal(
            "init",
            &self.config.scripts.init,
            |script| DeployError::InitMissing { script },
            DeployError::InitFailed,
        );
        runner.run_step(&init, &env)?;

        MarkerRecord::new(&bundle.sha256).create(&self.config.marker_path())?;
        info!("marked deployed at {}", self.config.marker_path().display());
        Ok(env)
    }

    // ---------------------------------------------------------------------------
    // Redeploy
    // ---------------------------------------------------------------------------

    fn redeploy(&self, bundle: &Bundle) -> std::result::Result<DeployReport, Failure> {
        let runner = self.runner(DeploymentState::Deployed);
        let app_dir = self.config.app_dir();
        let backup_dir = self.config.backup_dir();
        info!("redeploying into {}", app_dir.display());

        let stopped = self.stop(&runner);

        if let Err(e) = backup::snapshot(&app_dir, &backup_dir) {
            let failure = Failure::fatal(e);
            return Err(if stopped {
                self.restart_in_place(failure)
            } else {
                failure
            });
        }

        let env = self
            .install_update(bundle, &runner)
            .and_then(|env| {
                self.start(&runner, &env)?;
                Ok(env)
            })
            .map_err(|e| self.recover(Failure::recoverable(e)))?;

        Ok(DeployReport {
            previous_state: DeploymentState::Deployed,
            bundle_sha256: bundle.sha256.clone(),
            stopped,
            variables: env.len(),
            backup_dir: Some(backup_dir),
        })
    }

    fn install_update(&self, bundle: &Bundle, runner: &ScriptRunner) -> Result<Environment> {
        let app_dir = self.config.app_dir();

        io::clear_dir(&app_dir, &self.config.preserve)
            .map_err(|e| DeployError::ClearFailed(e.to_string()))?;
        bundle::unpack(&bundle.path, &app_dir)
            .map_err(|e| DeployError::RedeployUnpackFailed(e.to_string()))?;
        info!("bundle unpacked");

        if !runner.exists(&self.config.scripts.start) {
            return Err(DeployError::StartMissingAfterUnpack {
                script: self.config.scripts.start.clone(),
            });
        }

        self.load_env(runner, |script| DeployError::RedeploySecretsLoaderMissing {
            script,
        })
    }

    /// Best-effort stop of the running version. Returns whether it completed.
    fn stop(&self, runner: &ScriptRunner) -> bool {
        let env = Environment::load_file(&self.config.env_path()).unwrap_or_else(|e| {
            warn!("{e}; stopping with an empty environment");
            Environment::default()
        });
        let step = Step::best_effort("stop", &self.config.scripts.stop);
        matches!(
            runner.run_step(&step, &env),
            Ok(StepOutcome::Completed { .. })
        )
    }

    // ---------------------------------------------------------------------------
    // Shared steps
    // ---------------------------------------------------------------------------

    fn load_env(
        &self,
        runner: &ScriptRunner,
        missing_loader: fn(String) -> DeployError,
    ) -> Result<Environment> {
        let base = Environment::load_file(&self.config.env_path())?;
        env::load_secrets(runner, &self.config.scripts.load_secrets, &base, missing_loader)
    }

    fn start(&self, runner: &ScriptRunner, env: &Environment) -> Result<()> {
        let step = Step::fatal(
            "start",
            &self.config.scripts.start,
            |script| DeployError::StartMissing { script },
            DeployError::StartFailed,
        );
        runner.run_step(&step, env)?;
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Recovery
    // ---------------------------------------------------------------------------

    fn recover(&self, failure: Failure) -> Failure {
        error!("{}", failure.error);
        warn!("rolling back to the previous version");
        self.settle(failure, RollbackOutcome::Restored, || {
            self.restore_and_restart()
        })
    }

    /// The snapshot failed after the running version was stopped. The app
    /// dir is still intact, so bring that version back up as it is.
    fn restart_in_place(&self, failure: Failure) -> Failure {
        error!("{}", failure.error);
        warn!("restarting the stopped version in place");
        self.settle(failure, RollbackOutcome::Restarted, || self.restart())
    }

    fn settle(
        &self,
        mut failure: Failure,
        success: RollbackOutcome,
        attempt: impl FnOnce() -> Result<()>,
    ) -> Failure {
        failure.rollback = match attempt() {
            Ok(()) => {
                info!("rollback complete");
                success
            }
            Err(e) => {
                error!("rollback failed: {e}");
                RollbackOutcome::Failed(DeployError::RollbackFailed {
                    original: failure.error.to_string(),
                    rollback: e.to_string(),
                })
            }
        };
        failure
    }

    fn restore_and_restart(&self) -> Result<()> {
        backup::restore(&self.config.backup_dir(), &self.config.app_dir())?;
        self.restart()
    }

    /// Start whatever is in the app dir now, with its own `.env` and secrets.
    fn restart(&self) -> Result<()> {
        let runner = self.runner(DeploymentState::Deployed);
        if !runner.exists(&self.config.scripts.start) {
            warn!(
                "{} not present in {}, previous version not restarted",
                self.config.scripts.start,
                self.config.app_dir().display()
            );
            return Ok(());
        }
        let base = Environment::load_file(&self.config.env_path())?;
        let env = if runner.exists(&self.config.scripts.load_secrets) {
            env::load_secrets(&runner, &self.config.scripts.load_secrets, &base, |script| {
                DeployError::SecretsLoaderMissing { script }
            })?
        } else {
            base
        };
        self.start(&runner, &env)
    }

    fn runner(&self, state: DeploymentState) -> ScriptRunner {
        let app_dir = self.config.app_dir();
        ScriptRunner::new(&app_dir, &self.config.scripts.interpreter)
            .with_log_file(self.config.log_path())
            .with_var("HOSTDEPLOY_ROOT", self.config.root.to_string_lossy())
            .with_var("HOSTDEPLOY_APP_DIR", app_dir.to_string_lossy())
            .with_var("HOSTDEPLOY_STATE", state.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{config_in, tree, BundleBuilder};
    use std::path::Path;
    use tempfile::TempDir;

    fn record(event: &str) -> String {
        format!("echo \"{event}\" >> \"$HOSTDEPLOY_ROOT/events.log\"")
    }

    /// A bundle carrying every lifecycle script, each logging an event.
    fn full_bundle(version: &str) -> BundleBuilder {
        BundleBuilder::new()
            .script("start.sh", &record(&format!("start {version} $APP_MODE $TOKEN")))
            .script("stop.sh", &record(&format!("stop {version}")))
            .script("init.sh", &record(&format!("init {version}")))
            .script("load-secrets.sh", "echo TOKEN=abc")
            .file("VERSION", version)
    }

    fn events(root: &Path) -> Vec<String> {
        std::fs::read_to_string(root.join("events.log"))
            .unwrap_or_default()
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }

    fn deploy(root: &Path, bundle: BundleBuilder) -> std::result::Result<DeployReport, Failure> {
        let config = config_in(root);
        bundle.write(&config.bundle_path());
        Deployer::new(config).run()
    }

    #[test]
    fn first_deploy_transitions_to_deployed() {
        let root = TempDir::new().unwrap();
        let report = deploy(root.path(), full_bundle("v1")).unwrap();

        assert_eq!(report.previous_state, DeploymentState::Fresh);
        assert!(report.backup_dir.is_none());
        let deployer = Deployer::new(config_in(root.path()));
        assert_eq!(deployer.state(), DeploymentState::Deployed);
        let marker = MarkerRecord::load(&deployer.config().marker_path()).unwrap();
        assert_eq!(marker.bundle_sha256, report.bundle_sha256);
        assert_eq!(events(root.path()), vec!["init v1", "start v1 abc"]);
        assert_eq!(
            std::fs::read_to_string(root.path().join("current/VERSION")).unwrap(),
            "v1"
        );
    }

    #[test]
    fn redeploy_does_not_rewrite_marker() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        let marker = root.path().join(".deployed");
        let first = std::fs::read(&marker).unwrap();

        deploy(root.path(), full_bundle("v2")).unwrap();
        assert_eq!(std::fs::read(&marker).unwrap(), first);
    }

    #[test]
    fn invalid_bundle_leaves_app_untouched() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        deploy(root.path(), full_bundle("v2")).unwrap();
        let app_before = tree(&root.path().join("current"));
        let backup_before = tree(&root.path().join("backup"));

        let config = config_in(root.path());
        std::fs::write(config.bundle_path(), b"garbage").unwrap();
        let failure = Deployer::new(config.clone()).run().unwrap_err();
        assert_eq!(failure.exit_code(), 2);
        assert!(!failure.recoverable);
        assert!(matches!(failure.rollback, RollbackOutcome::NotAttempted));

        BundleBuilder::new()
            .file("VERSION", "v3")
            .write(&config.bundle_path());
        let failure = Deployer::new(config).run().unwrap_err();
        assert_eq!(failure.exit_code(), 3);

        assert_eq!(tree(&root.path().join("current")), app_before);
        assert_eq!(tree(&root.path().join("backup")), backup_before);
    }

    #[test]
    fn missing_bundle_on_fresh_host_creates_nothing() {
        let root = TempDir::new().unwrap();
        let failure = Deployer::new(config_in(root.path())).run().unwrap_err();
        assert_eq!(failure.exit_code(), 1);
        assert!(!root.path().join("current").exists());
        assert!(!root.path().join(".deployed").exists());
    }

    #[test]
    fn redeploy_backs_up_and_replaces() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1").file("old-only.txt", "x")).unwrap();
        let v1_tree = tree(&root.path().join("current"));

        let report = deploy(root.path(), full_bundle("v2")).unwrap();
        assert_eq!(report.previous_state, DeploymentState::Deployed);
        assert!(report.stopped);

        assert_eq!(tree(&root.path().join("backup")), v1_tree);

        let expected = TempDir::new().unwrap();
        bundle::unpack(&root.path().join("upload/bundle.tar.gz"), expected.path()).unwrap();
        assert_eq!(tree(&root.path().join("current")), tree(expected.path()));

        assert_eq!(
            events(root.path()),
            vec!["init v1", "start v1 abc", "stop v1", "start v2 abc"]
        );
    }

    #[test]
    fn failed_unpack_restores_previous_version() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        let v1_tree = tree(&root.path().join("current"));

        let broken = full_bundle("v2")
            .file("lib", "plain file")
            .file("lib/app.txt", "v2");
        let failure = deploy(root.path(), broken).unwrap_err();

        assert_eq!(failure.code(), 13);
        assert_eq!(failure.exit_code(), 13);
        assert!(failure.recoverable);
        assert!(matches!(failure.rollback, RollbackOutcome::Restored));
        assert_eq!(tree(&root.path().join("current")), v1_tree);
        assert_eq!(events(root.path()).last().unwrap(), "start v1 abc");
    }

    #[test]
    fn missing_stop_script_is_not_fatal() {
        let root = TempDir::new().unwrap();
        let without_stop = BundleBuilder::new()
            .script("start.sh", &record("start v1"))
            .script("init.sh", "true")
            .script("load-secrets.sh", "true");
        deploy(root.path(), without_stop).unwrap();

        let report = deploy(root.path(), full_bundle("v2")).unwrap();
        assert!(!report.stopped);
        assert_eq!(
            Deployer::new(config_in(root.path())).state(),
            DeploymentState::Deployed
        );
        assert_eq!(events(root.path()).last().unwrap(), "start v2 abc");
    }

    #[test]
    fn failing_start_on_redeploy_rolls_back() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        let v1_tree = tree(&root.path().join("current"));

        let bad = BundleBuilder::new()
            .script("start.sh", "exit 1")
            .script("load-secrets.sh", "true");
        let failure = deploy(root.path(), bad).unwrap_err();

        assert_eq!(failure.exit_code(), 18);
        assert_eq!(tree(&root.path().join("current")), v1_tree);
        assert_eq!(events(root.path()).last().unwrap(), "start v1 abc");
    }

    #[test]
    fn missing_secrets_on_redeploy_rolls_back() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();

        let no_secrets = BundleBuilder::new().script("start.sh", &record("start v2"));
        let failure = deploy(root.path(), no_secrets).unwrap_err();

        assert_eq!(failure.exit_code(), 15);
        assert!(matches!(failure.rollback, RollbackOutcome::Restored));
        assert_eq!(
            std::fs::read_to_string(root.path().join("current/VERSION")).unwrap(),
            "v1"
        );
    }

    #[test]
    fn rollback_failure_escalates() {
        let root = TempDir::new().unwrap();
        let fragile = BundleBuilder::new()
            .script(
                "start.sh",
                "[ ! -f \"$HOSTDEPLOY_ROOT/block-start\" ]",
            )
            .script("init.sh", "true")
            .script("load-secrets.sh", "true");
        deploy(root.path(), fragile).unwrap();
        std::fs::write(root.path().join("block-start"), "").unwrap();

        let bad = BundleBuilder::new()
            .script("start.sh", "exit 1")
            .script("load-secrets.sh", "true");
        let failure = deploy(root.path(), bad).unwrap_err();

        assert_eq!(failure.code(), 18);
        assert_eq!(failure.exit_code(), 21);
        assert!(matches!(failure.rollback, RollbackOutcome::Failed(_)));
    }

    #[test]
    fn fresh_failures_do_not_roll_back() {
        let root = TempDir::new().unwrap();
        let no_init = BundleBuilder::new()
            .script("start.sh", "true")
            .script("load-secrets.sh", "true");
        let failure = deploy(root.path(), no_init).unwrap_err();

        assert_eq!(failure.exit_code(), 8);
        assert!(!failure.recoverable);
        assert!(!root.path().join(".deployed").exists());
        assert!(!root.path().join("backup").exists());

        let no_secrets = BundleBuilder::new()
            .script("start.sh", "true")
            .script("init.sh", "true");
        let failure = deploy(root.path(), no_secrets).unwrap_err();
        assert_eq!(failure.exit_code(), 6);
        assert!(!root.path().join("current/load-secrets.sh").exists());
    }

    #[test]
    fn fresh_deploy_clears_leftovers_but_keeps_env() {
        let root = TempDir::new().unwrap();
        let app = root.path().join("current");
        std::fs::create_dir_all(app.join("stale")).unwrap();
        std::fs::write(app.join("stale/old.txt"), "x").unwrap();
        std::fs::write(app.join(".env"), "APP_MODE=staging\n").unwrap();

        deploy(root.path(), full_bundle("v1")).unwrap();

        assert!(!app.join("stale").exists());
        assert!(app.join(".env").exists());
        assert_eq!(events(root.path()).last().unwrap(), "start v1 staging abc");
    }

    fn blocked_backup(root: &Path) -> DeployConfig {
        std::fs::write(root.join("blocker"), "").unwrap();
        let mut config = config_in(root);
        config.backup_dir = Some(root.join("blocker/backup"));
        config
    }

    #[test]
    fn failed_backup_restarts_stopped_version() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        let v1_tree = tree(&root.path().join("current"));

        let config = blocked_backup(root.path());
        full_bundle("v2").write(&config.bundle_path());
        let failure = Deployer::new(config).run().unwrap_err();

        assert_eq!(failure.exit_code(), 11);
        assert!(!failure.recoverable);
        assert!(matches!(failure.rollback, RollbackOutcome::Restarted));
        assert_eq!(tree(&root.path().join("current")), v1_tree);
        assert_eq!(
            events(root.path()),
            vec!["init v1", "start v1 abc", "stop v1", "start v1 abc"]
        );
    }

    #[test]
    fn failed_restart_after_backup_failure_escalates() {
        let root = TempDir::new().unwrap();
        let fragile = BundleBuilder::new()
            .script("start.sh", "[ ! -f \"$HOSTDEPLOY_ROOT/block-start\" ]")
            .script("stop.sh", "true")
            .script("init.sh", "true")
            .script("load-secrets.sh", "true");
        deploy(root.path(), fragile).unwrap();
        std::fs::write(root.path().join("block-start"), "").unwrap();

        let config = blocked_backup(root.path());
        full_bundle("v2").write(&config.bundle_path());
        let failure = Deployer::new(config).run().unwrap_err();

        assert_eq!(failure.code(), 11);
        assert_eq!(failure.exit_code(), 21);
        assert!(matches!(failure.rollback, RollbackOutcome::Failed(_)));
    }

    #[test]
    fn failed_backup_without_stop_leaves_app_running() {
        let root = TempDir::new().unwrap();
        let without_stop = BundleBuilder::new()
            .script("start.sh", &record("start v1"))
            .script("init.sh", "true")
            .script("load-secrets.sh", "true");
        deploy(root.path(), without_stop).unwrap();

        let config = blocked_backup(root.path());
        full_bundle("v2").write(&config.bundle_path());
        let failure = Deployer::new(config).run().unwrap_err();

        assert_eq!(failure.exit_code(), 11);
        assert!(matches!(failure.rollback, RollbackOutcome::NotAttempted));
        assert_eq!(events(root.path()), vec!["start v1"]);
    }

    #[test]
    fn preserved_env_survives_redeploy() {
        let root = TempDir::new().unwrap();
        deploy(root.path(), full_bundle("v1")).unwrap();
        std::fs::write(root.path().join("current/.env"), "APP_MODE=prod\n").unwrap();

        deploy(root.path(), full_bundle("v2")).unwrap();

        assert!(root.path().join("current/.env").exists());
        assert!(root.path().join("backup/.env").exists());
        assert_eq!(events(root.path()).last().unwrap(), "start v2 prod abc");
    }

    #[test]
    fn manual_rollback_requires_backup() {
        let root = TempDir::new().unwrap();
        let deployer = Deployer::new(config_in(root.path()));
        assert!(matches!(
            deployer.rollback().unwrap_err(),
            DeployError::NotDeployed(_)
        ));

        deploy(root.path(), full_bundle("v1")).unwrap();
        assert!(matches!(
            deployer.rollback().unwrap_err(),
            DeployError::NoBackup(_)
        ));

        let v1_tree = tree(&root.path().join("current"));
        deploy(root.path(), full_bundle("v2")).unwrap();
        deployer.rollback().unwrap();
        assert_eq!(tree(&root.path().join("current")), v1_tree);
        assert_eq!(events(root.path()).last().unwrap(), "start v1 abc");
    }

    #[test]
    fn status_reports_layout() {
        let root = TempDir::new().unwrap();
        let deployer = Deployer::new(config_in(root.path()));
        let status = deployer.status();
        assert_eq!(status.state, DeploymentState::Fresh);
        assert!(!status.bundle_present);
        assert!(status.marker.is_none());

        deploy(root.path(), full_bundle("v1")).unwrap();
        let status = deployer.status();
        assert_eq!(status.state, DeploymentState::Deployed);
        assert!(status.bundle_present);
        assert!(!status.backup_present);
        assert!(status.marker.is_some());
    }
}
