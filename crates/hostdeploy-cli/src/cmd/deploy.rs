use crate::output::print_json;
use hostdeploy_core::{DeployConfig, Deployer};
use tracing::error;

pub fn run(config: &DeployConfig, json: bool) -> anyhow::Result<()> {
    let deployer = Deployer::new(config.clone());
    match deployer.run() {
        Ok(report) => {
            if json {
                print_json(&report)?;
            }
            Ok(())
        }
        Err(failure) => {
            error!(
                "deployment failed (exit {}): {failure}",
                failure.exit_code()
            );
            Err(failure.into())
        }
    }
}
