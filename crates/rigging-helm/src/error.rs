//! Error types for rigging-helm

use rigging_core::CoreError;
use rigging_engine::EngineError;
use thiserror::Error;

/// Result type for rigging-helm operations
pub type Result<T> = std::result::Result<T, HelmError>;

/// Errors that can occur while deploying helm releases
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HelmError {
    /// A release failed; wraps the cause with the resolved release name
    #[error("deploying {name}: {source}")]
    Release {
        name: String,
        #[source]
        source: Box<HelmError>,
    },

    /// Cleanup of a release failed
    #[error("deleting {name}: {source}")]
    Delete {
        name: String,
        #[source]
        source: Box<HelmError>,
    },

    /// The release name template did not expand
    #[error("cannot parse the release name template '{template}': {source}")]
    NameTemplate {
        template: String,
        #[source]
        source: EngineError,
    },

    /// helm exited unsuccessfully
    #[error("running `{command}` failed ({status}):\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// helm could not be started
    #[error("cannot start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The invocation was cancelled and the process killed
    #[error("`{command}` cancelled")]
    Cancelled { command: String },

    /// `helm version` output has no `v` marker
    #[error("v not found in output: {output:?}")]
    VersionNotFound { output: String },

    /// `helm version` output is not a semantic version
    #[error("cannot parse helm version {raw:?}: {source}")]
    VersionParse {
        raw: String,
        #[source]
        source: semver::Error,
    },

    /// `helm dep build` failed
    #[error("building helm dependencies: {0}")]
    DependencyBuild(#[source] Box<HelmError>),

    /// Overrides could not be serialized
    #[error("cannot marshal overrides to create overrides values.yaml: {0}")]
    OverridesMarshal(#[source] serde_yaml::Error),

    /// Overrides file could not be written
    #[error("cannot create file {path}: {source}")]
    OverridesWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Temporary packaging directory could not be created
    #[error("tempdir: {0}")]
    TempDir(#[source] std::io::Error),

    /// A packaging template did not expand
    #[error("concretize \"{field}\" template: {source}")]
    Concretize {
        field: &'static str,
        #[source]
        source: EngineError,
    },

    /// `helm package` failed
    #[error("package chart into a .tgz archive: {args:?}: {source}")]
    PackageCommand {
        args: Vec<String>,
        #[source]
        source: Box<HelmError>,
    },

    /// `helm package` output does not name the archive
    #[error("cannot locate packaged chart archive")]
    ArchiveNotFound,

    /// A chart value references an image that was not built
    #[error("no build present for {image}")]
    NoBuildPresent { image: String },

    /// A built tag is not a valid image reference
    #[error("cannot parse the image reference {reference}: {source}")]
    ImageReference {
        reference: String,
        #[source]
        source: CoreError,
    },

    /// `explicitRegistry` requires a registry in the tag
    #[error("image reference {reference} has no domain")]
    NoDomain { reference: String },

    /// A `setValueTemplates` entry did not expand
    #[error("expanding set value template for '{key}': {source}")]
    SetValueTemplate {
        key: String,
        #[source]
        source: EngineError,
    },

    /// A values file path starts with a `~` that cannot be expanded
    #[error("unable to expand {path}: {reason}")]
    ValuesFile { path: String, reason: String },

    /// A values file path template did not expand
    #[error("unable to expand {path}: {source}")]
    ValuesFileTemplate {
        path: String,
        #[source]
        source: EngineError,
    },

    /// Walking a chart directory failed
    #[error("failure accessing path '{path}': {source}")]
    WalkPath {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HelmError {
    /// Wrap this error with the name of the release it belongs to
    pub fn in_release(self, name: impl Into<String>) -> Self {
        HelmError::Release {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error, or any error it wraps, is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            HelmError::Cancelled { .. } => true,
            HelmError::Release { source, .. }
            | HelmError::Delete { source, .. }
            | HelmError::DependencyBuild(source)
            | HelmError::PackageCommand { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
