//! Cleanup command - delete every configured release

use console::style;
use rigging_helm::{DeployerOptions, HelmDeployer, ProcessRunner};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::util::load_deploy_config;

/// Run the cleanup command
pub async fn run(
    config: &Path,
    helm_binary: &Path,
    options: DeployerOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let deploy = load_deploy_config(config)?;
    let count = deploy.releases.len();

    let deployer = HelmDeployer::new(deploy, options, ProcessRunner::new(helm_binary));
    let mut stdout = std::io::stdout();
    deployer.cleanup(&mut stdout, cancel).await?;

    println!(
        "{} Deleted {} release(s)",
        style("✓").green().bold(),
        style(count).cyan()
    );
    Ok(())
}
