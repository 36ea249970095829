//! Deploy command - install or upgrade every configured release

use console::style;
use rigging_core::BuildArtifact;
use rigging_helm::{DeployerOptions, HelmDeployer, ProcessRunner};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::util::load_deploy_config;

/// Run the deploy command
pub async fn run(
    config: &Path,
    helm_binary: &Path,
    options: DeployerOptions,
    builds: &[BuildArtifact],
    cancel: &CancellationToken,
) -> Result<()> {
    let deploy = load_deploy_config(config)?;
    println!(
        "{} Deploying {} release(s) with {} image(s)",
        style("→").blue().bold(),
        style(deploy.releases.len()).cyan(),
        style(builds.len()).cyan()
    );

    let deployer = HelmDeployer::new(deploy, options, ProcessRunner::new(helm_binary));
    let mut stdout = std::io::stdout();
    let result = deployer.deploy(&mut stdout, builds, cancel).await?;

    if !result.artifacts.is_empty() {
        println!();
        println!("{}", style("Deployed objects:").bold());
        for artifact in &result.artifacts {
            let namespace = artifact
                .object_namespace
                .as_deref()
                .unwrap_or(&artifact.namespace);
            if namespace.is_empty() {
                println!("  {}", artifact);
            } else {
                println!("  {} {}", artifact, style(format!("({namespace})")).dim());
            }
        }
    }

    println!();
    if result.namespaces.is_empty() {
        println!("{} Deploy complete", style("✓").green().bold());
    } else {
        println!(
            "{} Deploy complete in namespace(s) {}",
            style("✓").green().bold(),
            style(result.namespaces.join(", ")).yellow()
        );
    }

    Ok(())
}
