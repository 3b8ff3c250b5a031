use crate::output::{print_json, print_table};
use hostdeploy_core::{DeployConfig, Deployer};

pub fn run(config: &DeployConfig, json: bool) -> anyhow::Result<()> {
    let status = Deployer::new(config.clone()).status();

    if json {
        print_json(&status)?;
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" }.to_string();
    let mut rows = vec![
        vec!["state".to_string(), status.state.to_string()],
        vec!["app_dir".to_string(), status.app_dir.display().to_string()],
        vec!["bundle".to_string(), status.bundle.display().to_string()],
        vec!["bundle_present".to_string(), yes_no(status.bundle_present)],
        vec!["backup_present".to_string(), yes_no(status.backup_present)],
    ];
    if let Some(marker) = &status.marker {
        rows.push(vec![
            "deployed_at".to_string(),
            marker
                .deployed_at
                .with_timezone(&chrono::Local)
                .format(crate::logging::TIMESTAMP_FORMAT)
                .to_string(),
        ]);
        rows.push(vec![
            "bundle_sha256".to_string(),
            marker.bundle_sha256.clone(),
        ]);
    }
    print_table(&["FIELD", "VALUE"], rows);
    Ok(())
}
