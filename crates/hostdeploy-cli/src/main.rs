mod cmd;
mod logging;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use hostdeploy_core::{DeployError, Failure};
use settings::Overrides;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "hostdeploy",
    about = "Deploy an application bundle onto this host, with backup and rollback",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: /etc/hostdeploy/config.yaml when present)
    #[arg(long, global = true, env = "HOSTDEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Deployment root; default locations for every other path hang off it
    #[arg(long, global = true, env = "HOSTDEPLOY_ROOT")]
    root: Option<PathBuf>,

    /// Bundle archive to deploy (.tar.gz)
    #[arg(long, global = true, env = "HOSTDEPLOY_BUNDLE")]
    bundle: Option<PathBuf>,

    /// Live application directory
    #[arg(long, global = true, env = "HOSTDEPLOY_APP_DIR")]
    app_dir: Option<PathBuf>,

    /// Backup directory used for rollback
    #[arg(long, global = true, env = "HOSTDEPLOY_BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// Persistent log file
    #[arg(long, global = true, env = "HOSTDEPLOY_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Validate the bundle and deploy it (default)
    Deploy,

    /// Check the bundle without touching the application directory
    Validate,

    /// Show deployment state, marker and backup
    Status,

    /// Restore the last backup and restart it
    Rollback,
}

impl Commands {
    /// Only commands that change the host write to the deploy log.
    fn writes_log(self) -> bool {
        matches!(self, Commands::Deploy | Commands::Rollback)
    }
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Deploy);
    let fallback_log = settings::fallback_log_path(cli.root.as_deref(), cli.log_file.as_deref());

    let config = match settings::resolve_config(
        cli.config.as_deref(),
        Overrides {
            root: cli.root,
            bundle: cli.bundle,
            app_dir: cli.app_dir,
            backup_dir: cli.backup_dir,
            log_file: cli.log_file,
        },
    ) {
        Ok(config) => config,
        Err(e) => {
            let log_file = command.writes_log().then_some(fallback_log);
            logging::init(log_file.as_deref(), cli.json);
            error!("{e}");
            std::process::exit(i32::from(e.code()));
        }
    };

    let log_file = command.writes_log().then(|| config.log_path());
    logging::init(log_file.as_deref(), cli.json);

    let result = match command {
        Commands::Deploy => cmd::deploy::run(&config, cli.json),
        Commands::Validate => cmd::validate::run(&config, cli.json),
        Commands::Status => cmd::status::run(&config, cli.json),
        Commands::Rollback => cmd::rollback::run(&config),
    };

    if let Err(e) = result {
        std::process::exit(exit_code(&e));
    }
}

/// Map an error to the process exit code. Deploy failures were already
/// logged by the command; anything else is printed here.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(failure) = err.downcast_ref::<Failure>() {
        return i32::from(failure.exit_code());
    }
    eprintln!("error: {err:#}");
    err.downcast_ref::<DeployError>()
        .map(|e| i32::from(e.code()))
        .unwrap_or(1)
}
