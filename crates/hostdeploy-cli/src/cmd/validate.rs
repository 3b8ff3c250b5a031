use crate::output::print_json;
use hostdeploy_core::{DeployConfig, Deployer};

pub fn run(config: &DeployConfig, json: bool) -> anyhow::Result<()> {
    let bundle = Deployer::new(config.clone()).validate()?;

    if json {
        print_json(&serde_json::json!({
            "bundle": bundle.path,
            "entries": bundle.entries,
            "sha256": bundle.sha256,
        }))?;
        return Ok(());
    }

    println!(
        "bundle ok: {} ({} entries, sha256 {})",
        bundle.path.display(),
        bundle.entries,
        bundle.sha256
    );
    Ok(())
}
