//! Deps command - list the files a deploy depends on

use rigging_helm::dependencies;
use std::path::Path;

use crate::error::{CliError, Result};
use crate::util::load_deploy_config;

/// Print one dependency path per line
pub fn run(config: &Path) -> Result<()> {
    let deploy = load_deploy_config(config)?;
    let deps = dependencies(&deploy.releases).map_err(|e| CliError::config(e.to_string()))?;

    for dep in deps {
        println!("{dep}");
    }
    Ok(())
}
