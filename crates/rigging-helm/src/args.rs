//! Argument assembly for `helm install` and `helm upgrade`
//!
//! The order of the assembled arguments is fixed so identical configuration
//! always yields an identical command line.

use indexmap::IndexMap;
use rigging_core::{BuildArtifact, HelmRelease};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::binder::image_set_from_config;
use crate::error::{HelmError, Result};
use crate::version::HelmSyntax;

/// Per-release options for an install or upgrade
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Expanded release name
    pub release_name: String,

    /// Effective namespace, empty for helm's default
    pub namespace: String,

    /// Chart directory, remote chart, or packaged archive
    pub chart_path: String,

    /// Mode-specific flags from the deploy configuration
    pub flags: Vec<String>,

    /// Upgrade an existing release rather than install
    pub upgrade: bool,

    /// Pass `--force` on upgrade
    pub force: bool,

    /// Syntax of the helm binary in use
    pub syntax: HelmSyntax,

    /// Overrides values file written for this release
    pub overrides_file: Option<String>,
}

impl InstallOptions {
    /// Options for upgrading `release_name` from `chart_path`
    pub fn upgrade(release_name: impl Into<String>, chart_path: impl Into<String>) -> Self {
        Self {
            release_name: release_name.into(),
            chart_path: chart_path.into(),
            upgrade: true,
            ..Default::default()
        }
    }

    /// Options for installing `release_name` from `chart_path`
    pub fn install(release_name: impl Into<String>, chart_path: impl Into<String>) -> Self {
        Self {
            release_name: release_name.into(),
            chart_path: chart_path.into(),
            upgrade: false,
            ..Default::default()
        }
    }
}

/// Values passed to `--set`/`--set-string` during one deploy
///
/// A built tag that never shows up here was not consumed by any release.
#[derive(Debug, Clone, Default)]
pub struct ValuesSetTracker {
    values: HashSet<String>,
}

impl ValuesSetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: impl Into<String>) {
        self.values.insert(value.into());
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Builds whose tag was never set on any release
    pub fn unused<'a>(&self, builds: &'a [BuildArtifact]) -> Vec<&'a BuildArtifact> {
        builds.iter().filter(|b| !self.contains(&b.tag)).collect()
    }
}

/// Template variables describing one image
///
/// `DIGEST` holds the whole tag. `DIGEST_ALGO`/`DIGEST_HEX` split it on the
/// first colon; without a colon only `DIGEST_HEX` is set.
pub fn env_var_for_image(image_name: &str, digest: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::from([
        ("IMAGE_NAME".to_string(), image_name.to_string()),
        ("DIGEST".to_string(), digest.to_string()),
    ]);

    if digest.is_empty() {
        return vars;
    }

    match digest.split_once(':') {
        Some((algo, hex)) => {
            vars.insert("DIGEST_ALGO".to_string(), algo.to_string());
            vars.insert("DIGEST_HEX".to_string(), hex.to_string());
        }
        None => {
            vars.insert("DIGEST_HEX".to_string(), digest.to_string());
        }
    }
    vars
}

/// Template variables for all builds; the Nth build (N ≥ 2) gets suffix N
pub fn build_env_map(builds: &[BuildArtifact]) -> BTreeMap<String, String> {
    let mut env_map = BTreeMap::new();
    for (idx, build) in builds.iter().enumerate() {
        let suffix = if idx == 0 {
            String::new()
        } else {
            (idx + 1).to_string()
        };

        for (k, v) in env_var_for_image(&build.image_name, &build.tag) {
            env_map.insert(format!("{k}{suffix}"), v);
        }
    }
    env_map
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_home(path: &str) -> Result<String> {
    let Some(rest) = path.strip_prefix('~') else {
        return Ok(path.to_string());
    };

    if !rest.is_empty() && !rest.starts_with(['/', '\\']) {
        return Err(HelmError::ValuesFile {
            path: path.to_string(),
            reason: "cannot expand user-specific home dir".to_string(),
        });
    }

    let home = dirs::home_dir().ok_or_else(|| HelmError::ValuesFile {
        path: path.to_string(),
        reason: "cannot determine home directory".to_string(),
    })?;

    Ok(format!("{}{}", home.display(), rest))
}

/// Assemble the arguments of `helm install` or `helm upgrade`
///
/// `params` are the release's values already paired with their builds (see
/// [`pair_params_to_artifacts`](crate::binder::pair_params_to_artifacts)).
/// Every tag or value passed with `--set`, `--set-string` or `--set-file` is
/// recorded in `values_set`.
pub fn install_args(
    release: &HelmRelease,
    builds: &[BuildArtifact],
    params: &IndexMap<String, BuildArtifact>,
    values_set: &mut ValuesSetTracker,
    opts: &InstallOptions,
) -> Result<Vec<String>> {
    let mut args: Vec<String> = Vec::new();

    if opts.upgrade {
        args.extend(["upgrade".to_string(), opts.release_name.clone()]);
        args.extend(opts.flags.iter().cloned());

        if opts.force {
            args.push("--force".to_string());
        }

        if release.recreate_pods {
            args.push("--recreate-pods".to_string());
        }
    } else {
        args.extend(opts.syntax.install_args(&opts.release_name));
        args.extend(opts.flags.iter().cloned());
    }

    // A packaged chart already carries its version.
    if release.packaged.is_none() && !release.version.is_empty() {
        args.extend(["--version".to_string(), release.version.clone()]);
    }

    args.push(opts.chart_path.clone());

    if !opts.namespace.is_empty() {
        args.extend(["--namespace".to_string(), opts.namespace.clone()]);
    }

    if let Some(overrides) = &opts.overrides_file {
        args.extend(["-f".to_string(), overrides.clone()]);
    }

    for (param, build) in params {
        let value = image_set_from_config(release.convention(), param, &build.tag)?;
        values_set.record(build.tag.clone());
        args.extend(["--set-string".to_string(), value]);
    }

    for (key, value) in &release.set_values {
        values_set.record(value.clone());
        args.extend(["--set".to_string(), format!("{key}={value}")]);
    }

    for (key, path) in &release.set_files {
        values_set.record(path.clone());
        args.extend(["--set-file".to_string(), format!("{key}={path}")]);
    }

    let env_map = build_env_map(builds);
    debug!(?env_map, "template variables for {}", opts.release_name);

    for (key, template) in &release.set_value_templates {
        let value = rigging_engine::expand(template, Some(&env_map)).map_err(|source| {
            HelmError::SetValueTemplate {
                key: key.clone(),
                source,
            }
        })?;
        values_set.record(value.clone());
        args.extend(["--set".to_string(), format!("{key}={value}")]);
    }

    for values_file in &release.values_files {
        let expanded = expand_home(values_file)?;
        let expanded = rigging_engine::expand(&expanded, Some(&env_map)).map_err(|source| {
            HelmError::ValuesFileTemplate {
                path: values_file.clone(),
                source,
            }
        })?;
        args.extend(["-f".to_string(), expanded]);
    }

    if release.wait {
        args.push("--wait".to_string());
    }

    Ok(args)
}
