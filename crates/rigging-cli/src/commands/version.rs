//! Helm-version command - report the helm binary in use

use console::style;
use rigging_core::HelmDeploy;
use rigging_helm::{DeployerOptions, HelmDeployer, HelmSyntax, ProcessRunner};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Run the helm-version command
pub async fn run(helm_binary: &Path, cancel: &CancellationToken) -> Result<()> {
    let deployer = HelmDeployer::new(
        HelmDeploy::default(),
        DeployerOptions::default(),
        ProcessRunner::new(helm_binary),
    );
    let version = deployer.bin_version(cancel).await?;

    let syntax = match HelmSyntax::for_version(Some(&version)) {
        HelmSyntax::V2 => "helm 2",
        HelmSyntax::V3 => "helm 3",
    };
    println!(
        "{} {} ({} syntax)",
        style(helm_binary.display()).cyan(),
        style(&version).yellow(),
        syntax
    );
    Ok(())
}
