//! Deploy configuration: Helm releases and the flags passed to every invocation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Top-level rigging configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiggingConfig {
    /// Helm deployer configuration
    #[serde(default)]
    pub deploy: HelmDeploy,
}

impl RiggingConfig {
    /// Load a configuration file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Helm deployer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmDeploy {
    /// Releases, deployed in declaration order
    #[serde(default)]
    pub releases: Vec<HelmRelease>,

    /// Extra flags passed to helm
    #[serde(default)]
    pub flags: HelmDeployFlags,
}

/// Additional flags for helm invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmDeployFlags {
    /// Appended to every invocation except `version`
    #[serde(default)]
    pub global: Vec<String>,

    /// Appended after `install --name <release>`
    #[serde(default)]
    pub install: Vec<String>,

    /// Appended after `upgrade <release>`
    #[serde(default)]
    pub upgrade: Vec<String>,
}

/// A single Helm release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmRelease {
    /// Release name (template)
    pub name: String,

    /// Local chart directory or remote chart reference
    pub chart_path: String,

    /// Values files passed with `-f`, may use `~` and templates
    #[serde(default)]
    pub values_files: Vec<String>,

    /// Chart parameter -> image name
    #[serde(default)]
    pub values: IndexMap<String, String>,

    /// Target namespace
    #[serde(default)]
    pub namespace: String,

    /// Chart version, only used for unpackaged charts
    #[serde(default)]
    pub version: String,

    /// Literal `--set` values
    #[serde(default)]
    pub set_values: BTreeMap<String, String>,

    /// `--set` values expanded against the build environment
    #[serde(default)]
    pub set_value_templates: BTreeMap<String, String>,

    /// `--set-file` values
    #[serde(default)]
    pub set_files: BTreeMap<String, String>,

    /// Pass `--wait`
    #[serde(default)]
    pub wait: bool,

    /// Pass `--recreate-pods` on upgrade
    #[serde(default)]
    pub recreate_pods: bool,

    /// Skip `helm dep build`
    #[serde(default)]
    pub skip_build_dependencies: bool,

    /// Run through the helm-secrets plugin
    #[serde(default)]
    pub use_helm_secrets: bool,

    /// The chart lives in a repository, not on the local filesystem
    #[serde(default)]
    pub remote: bool,

    /// Values written to an overrides file
    #[serde(default)]
    pub overrides: serde_yaml::Mapping,

    /// Package the chart before deploying it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaged: Option<HelmPackaged>,

    /// How built images map onto chart values
    #[serde(default)]
    pub image_strategy: ImageStrategy,
}

impl HelmRelease {
    /// Create a release for a local chart
    pub fn new(name: impl Into<String>, chart_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chart_path: chart_path.into(),
            ..Default::default()
        }
    }

    /// Image naming convention, if one is configured
    pub fn convention(&self) -> Option<&HelmConventionConfig> {
        self.image_strategy.helm.as_ref()
    }
}

/// Packaging parameters. Both fields are templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmPackaged {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub app_version: String,
}

/// Image strategy for chart values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStrategy {
    /// Split images into `repository`/`tag` (and optionally `registry`) keys.
    /// Without it the fully qualified tag is set on the parameter itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmConventionConfig>,
}

/// Helm image naming convention
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmConventionConfig {
    /// Emit a separate `registry` key
    #[serde(default)]
    pub explicit_registry: bool,
}
