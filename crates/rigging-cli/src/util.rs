//! Shared loaders for CLI commands

use rigging_core::{BuildArtifact, HelmDeploy, RiggingConfig};
use serde::Deserialize;
use std::path::Path;

use crate::error::{CliError, Result};

/// Builds file: the images produced by the build phase
#[derive(Debug, Default, Deserialize)]
struct BuildsFile {
    #[serde(default)]
    builds: Vec<BuildArtifact>,
}

/// Load the helm section of a rigging configuration file
pub fn load_deploy_config(path: &Path) -> Result<HelmDeploy> {
    let config = RiggingConfig::from_file(path)?;
    Ok(config.deploy)
}

/// Collect build artifacts from an optional builds file and `NAME=TAG` pairs
///
/// Pairs given on the command line come after the file's entries.
pub fn load_builds(file: Option<&Path>, images: &[String]) -> Result<Vec<BuildArtifact>> {
    let mut builds = match file {
        Some(path) => read_builds_file(path)?,
        None => Vec::new(),
    };

    for image in images {
        builds.push(parse_image_arg(image)?);
    }
    Ok(builds)
}

fn read_builds_file(path: &Path) -> Result<Vec<BuildArtifact>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::config(format!("cannot read builds file {}: {}", path.display(), e))
    })?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed: BuildsFile = if is_json {
        serde_json::from_str(&content).map_err(|e| {
            CliError::config(format!("invalid builds file {}: {}", path.display(), e))
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| {
            CliError::config(format!("invalid builds file {}: {}", path.display(), e))
        })?
    };

    Ok(parsed.builds)
}

/// Parse `NAME=TAG`
pub fn parse_image_arg(arg: &str) -> Result<BuildArtifact> {
    match arg.split_once('=') {
        Some((name, tag)) if !name.is_empty() && !tag.is_empty() => {
            Ok(BuildArtifact::new(name, tag))
        }
        _ => Err(CliError::config_with_help(
            format!("invalid image '{arg}'"),
            "Use NAME=TAG, e.g. --image web=registry.local/web:abc123",
        )),
    }
}
