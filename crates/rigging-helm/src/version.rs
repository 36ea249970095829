//! Helm binary version detection
//!
//! `helm version --short -c` prints `v3.1.0+gb29d20b` on Helm 3 and
//! `Client: v2.15.1+gcf1de4f` on Helm 2. Build metadata after `+` is dropped
//! before parsing.

use semver::Version;

use crate::error::{HelmError, Result};

/// Arguments that query the client version
pub const VERSION_ARGS: [&str; 3] = ["version", "--short", "-c"];

/// Parse the output of `helm version --short -c`
pub fn parse_version(output: &str) -> Result<Version> {
    let idx = output.find('v').ok_or_else(|| HelmError::VersionNotFound {
        output: output.to_string(),
    })?;

    let rest = &output[idx + 1..];
    let raw = rest.split('+').next().unwrap_or(rest).trim();

    Version::parse(raw).map_err(|source| HelmError::VersionParse {
        raw: raw.to_string(),
        source,
    })
}

/// Command syntax, which changed with Helm 3
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HelmSyntax {
    /// Helm 2, also used when the version is unknown
    #[default]
    V2,
    V3,
}

impl HelmSyntax {
    /// Pick the syntax for a resolved binary version
    pub fn for_version(version: Option<&Version>) -> Self {
        match version {
            Some(v) if v.major >= 3 => Self::V3,
            _ => Self::V2,
        }
    }

    /// Leading arguments of an install
    pub fn install_args(self, release: &str) -> Vec<String> {
        match self {
            Self::V2 => vec!["install".into(), "--name".into(), release.into()],
            Self::V3 => vec!["install".into(), release.into()],
        }
    }

    /// Arguments that query a release
    pub fn get_args(self, release: &str) -> Vec<String> {
        match self {
            Self::V2 => vec!["get".into(), release.into()],
            Self::V3 => vec!["get".into(), "all".into(), release.into()],
        }
    }

    /// Arguments that remove a release
    pub fn delete_args(self, release: &str) -> Vec<String> {
        match self {
            Self::V2 => vec!["delete".into(), release.into(), "--purge".into()],
            Self::V3 => vec!["uninstall".into(), release.into()],
        }
    }
}
