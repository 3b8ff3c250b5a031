use anyhow::Context;
use hostdeploy_core::{DeployConfig, Deployer};
use tracing::{error, info};

pub fn run(config: &DeployConfig) -> anyhow::Result<()> {
    let deployer = Deployer::new(config.clone());
    match deployer.rollback() {
        Ok(()) => {
            info!("rollback complete");
            Ok(())
        }
        Err(e) => {
            error!("rollback failed: {e}");
            Err(e).context("rollback failed")
        }
    }
}
