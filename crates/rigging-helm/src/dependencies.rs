//! Files a Helm deploy depends on
//!
//! Used to decide whether a change on disk should trigger a redeploy.

use rigging_core::HelmRelease;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{HelmError, Result};

/// Files that the given releases depend on, sorted
///
/// Every values file is included verbatim. Local charts contribute every file
/// in their tree, except files under `<chart>/charts` when `helm dep build`
/// runs for the release: that step rewrites the directory, and watching it
/// would retrigger the deploy forever.
pub fn dependencies(releases: &[HelmRelease]) -> Result<Vec<String>> {
    let mut deps = Vec::new();

    for release in releases {
        deps.extend(release.values_files.iter().cloned());

        // Remote charts are not on the local filesystem
        if release.remote {
            continue;
        }

        let chart_deps_dir = Path::new(&release.chart_path).join("charts");
        for entry in WalkDir::new(&release.chart_path) {
            let entry = entry.map_err(|source| {
                let path = source
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| release.chart_path.clone());
                HelmError::WalkPath { path, source }
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !path.starts_with(&chart_deps_dir) || release.skip_build_dependencies {
                deps.push(path.to_string_lossy().into_owned());
            }
        }
    }

    deps.sort();
    Ok(deps)
}
